//! Recurring session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        booking::BulkOutcome,
        recurring::{CreateRecurringSession, RecurringSession},
    },
};

use super::AuthenticatedUser;

/// Bulk decision request
#[derive(Deserialize, ToSchema)]
pub struct BulkRecurringRequest {
    pub ids: Vec<i32>,
}

/// Request a recurring session
#[utoipa::path(
    post,
    path = "/recurring-sessions",
    tag = "recurring",
    security(("bearer_auth" = [])),
    request_body = CreateRecurringSession,
    responses(
        (status = 201, description = "Template requested", body = RecurringSession),
        (status = 400, description = "Invalid date range or time of day"),
        (status = 403, description = "Not a lecturer"),
        (status = 409, description = "Occurrences collide with existing reservations")
    )
)]
pub async fn create_recurring(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateRecurringSession>,
) -> AppResult<(StatusCode, Json<RecurringSession>)> {
    let template = state.services.recurring.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// Get a recurring session template
#[utoipa::path(
    get,
    path = "/recurring-sessions/{id}",
    tag = "recurring",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template details", body = RecurringSession),
        (status = 404, description = "Template not found")
    )
)]
pub async fn get_recurring(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RecurringSession>> {
    let template = state.services.recurring.get(id).await?;
    Ok(Json(template))
}

/// The caller's own templates
#[utoipa::path(
    get,
    path = "/recurring-sessions/mine",
    tag = "recurring",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own templates", body = Vec<RecurringSession>)
    )
)]
pub async fn list_my_recurring(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RecurringSession>>> {
    let templates = state.services.recurring.list_mine(&claims).await?;
    Ok(Json(templates))
}

/// Pending templates awaiting a decision
#[utoipa::path(
    get,
    path = "/recurring-sessions/pending",
    tag = "recurring",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending templates", body = Vec<RecurringSession>),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_pending_recurring(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RecurringSession>>> {
    let templates = state.services.recurring.list_pending(&claims).await?;
    Ok(Json(templates))
}

/// Approve a template, materializing every occurrence
#[utoipa::path(
    post,
    path = "/recurring-sessions/{id}/approve",
    tag = "recurring",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Template ID")
    ),
    responses(
        (status = 200, description = "Template approved", body = RecurringSession),
        (status = 404, description = "Template not found"),
        (status = 409, description = "Occurrences collide; nothing was materialized")
    )
)]
pub async fn approve_recurring(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RecurringSession>> {
    let template = state.services.recurring.approve(&claims, id).await?;
    Ok(Json(template))
}

/// Reject a pending template
#[utoipa::path(
    post,
    path = "/recurring-sessions/{id}/reject",
    tag = "recurring",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Template ID")
    ),
    responses(
        (status = 204, description = "Template rejected and removed"),
        (status = 404, description = "Template not found"),
        (status = 409, description = "Template no longer pending")
    )
)]
pub async fn reject_recurring(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.recurring.reject(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancel an approved template and its future sessions
#[utoipa::path(
    post,
    path = "/recurring-sessions/{id}/cancel",
    tag = "recurring",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Template ID")
    ),
    responses(
        (status = 204, description = "Template and future sessions removed"),
        (status = 404, description = "Template not found")
    )
)]
pub async fn cancel_recurring(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.recurring.cancel(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approve several templates at once
#[utoipa::path(
    post,
    path = "/recurring-sessions/bulk-approve",
    tag = "recurring",
    security(("bearer_auth" = [])),
    request_body = BulkRecurringRequest,
    responses(
        (status = 200, description = "Per-item outcome", body = BulkOutcome)
    )
)]
pub async fn bulk_approve_recurring(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkRecurringRequest>,
) -> AppResult<Json<BulkOutcome>> {
    let outcome = state
        .services
        .recurring
        .bulk_approve(&claims, &request.ids)
        .await?;
    Ok(Json(outcome))
}
