//! Computer booking endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::booking::{BookingDetails, BulkOutcome, ComputerBooking, CreateBooking},
};

use super::AuthenticatedUser;

/// Cancellation request
#[derive(Deserialize, ToSchema)]
pub struct CancelRequest {
    /// Optional reason shown to the other party
    pub reason: Option<String>,
}

/// Bulk decision request
#[derive(Deserialize, ToSchema)]
pub struct BulkRequest {
    pub ids: Vec<i32>,
    pub reason: Option<String>,
}

/// Request a new computer booking
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking requested", body = ComputerBooking),
        (status = 400, description = "Invalid time window"),
        (status = 403, description = "Not a student"),
        (status = 409, description = "Slot already taken")
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<ComputerBooking>)> {
    let booking = state.services.bookings.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Get a booking
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking details", body = ComputerBooking),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ComputerBooking>> {
    let booking = state.services.bookings.get(&claims, id).await?;
    Ok(Json(booking))
}

/// The caller's own bookings
#[utoipa::path(
    get,
    path = "/bookings/mine",
    tag = "bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own bookings", body = Vec<ComputerBooking>)
    )
)]
pub async fn list_my_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ComputerBooking>>> {
    let bookings = state.services.bookings.list_mine(&claims).await?;
    Ok(Json(bookings))
}

/// Pending bookings awaiting a decision
#[utoipa::path(
    get,
    path = "/bookings/pending",
    tag = "bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending bookings", body = Vec<BookingDetails>),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_pending_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookingDetails>>> {
    let bookings = state.services.bookings.list_pending(&claims).await?;
    Ok(Json(bookings))
}

/// Approve a pending booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/approve",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking approved", body = ComputerBooking),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Slot taken or booking no longer pending")
    )
)]
pub async fn approve_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ComputerBooking>> {
    let booking = state.services.bookings.approve(&claims, id).await?;
    Ok(Json(booking))
}

/// Reject a pending booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/reject",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking rejected", body = ComputerBooking),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking no longer pending")
    )
)]
pub async fn reject_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ComputerBooking>> {
    let booking = state.services.bookings.reject(&claims, id).await?;
    Ok(Json(booking))
}

/// Cancel an approved booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Booking cancelled", body = ComputerBooking),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Too late to cancel or booking not approved")
    )
)]
pub async fn cancel_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<CancelRequest>,
) -> AppResult<Json<ComputerBooking>> {
    let booking = state
        .services
        .bookings
        .cancel(&claims, id, request.reason.as_deref())
        .await?;
    Ok(Json(booking))
}

/// Extend an in-progress booking by 30 minutes
#[utoipa::path(
    post,
    path = "/bookings/{id}/extend",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking extended", body = ComputerBooking),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Extension not available")
    )
)]
pub async fn extend_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ComputerBooking>> {
    let booking = state.services.bookings.extend(&claims, id).await?;
    Ok(Json(booking))
}

/// Approve several bookings at once
#[utoipa::path(
    post,
    path = "/bookings/bulk-approve",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = BulkRequest,
    responses(
        (status = 200, description = "Per-item outcome", body = BulkOutcome)
    )
)]
pub async fn bulk_approve_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkRequest>,
) -> AppResult<Json<BulkOutcome>> {
    let outcome = state
        .services
        .bookings
        .bulk_approve(&claims, &request.ids)
        .await?;
    Ok(Json(outcome))
}

/// Cancel several bookings at once
#[utoipa::path(
    post,
    path = "/bookings/bulk-cancel",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = BulkRequest,
    responses(
        (status = 200, description = "Per-item outcome", body = BulkOutcome)
    )
)]
pub async fn bulk_cancel_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkRequest>,
) -> AppResult<Json<BulkOutcome>> {
    let outcome = state
        .services
        .bookings
        .bulk_cancel(&claims, &request.ids, request.reason.as_deref())
        .await?;
    Ok(Json(outcome))
}
