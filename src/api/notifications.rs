//! Notification endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::notification::Notification};

use super::AuthenticatedUser;

/// Unread notification count
#[derive(Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

/// Mark-all-read outcome
#[derive(Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub marked: u64,
}

/// The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notifications", body = Vec<Notification>)
    )
)]
pub async fn list_notifications(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state
        .services
        .notifications
        .list_for_user(claims.user_id)
        .await?;
    Ok(Json(notifications))
}

/// Unread notification count
#[utoipa::path(
    get,
    path = "/notifications/unread",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse)
    )
)]
pub async fn unread_count(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let unread = state
        .services
        .notifications
        .unread_count(claims.user_id)
        .await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// Mark all of the caller's notifications as read
#[utoipa::path(
    post,
    path = "/notifications/mark-read",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "How many were marked", body = MarkReadResponse)
    )
)]
pub async fn mark_all_read(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MarkReadResponse>> {
    let marked = state
        .services
        .notifications
        .mark_all_read(claims.user_id)
        .await?;
    Ok(Json(MarkReadResponse { marked }))
}
