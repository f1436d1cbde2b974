//! Lab session and attendance endpoints

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
        attendance::{BookingAttendance, BulkAttendanceEntry, BulkAttendanceReport, MarkAttendance, SessionAttendance},
        booking::BulkOutcome,
        session::{CreateSession, LabSession, SessionDetails},
    },
};

use super::AuthenticatedUser;

/// Cancellation request
#[derive(Deserialize, ToSchema)]
pub struct CancelSessionRequest {
    pub reason: Option<String>,
}

/// Bulk decision request
#[derive(Deserialize, ToSchema)]
pub struct BulkSessionRequest {
    pub ids: Vec<i32>,
    pub reason: Option<String>,
}

/// Bulk attendance request
#[derive(Deserialize, ToSchema)]
pub struct BulkAttendanceRequest {
    pub entries: Vec<BulkAttendanceEntry>,
}

/// Request a lab session
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    security(("bearer_auth" = [])),
    request_body = CreateSession,
    responses(
        (status = 201, description = "Session requested", body = LabSession),
        (status = 400, description = "Invalid time window"),
        (status = 403, description = "Not a lecturer"),
        (status = 409, description = "Lab taken or too many overlapping bookings")
    )
)]
pub async fn create_session(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateSession>,
) -> AppResult<(StatusCode, Json<LabSession>)> {
    let session = state.services.sessions.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Get a session
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session details", body = LabSession),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LabSession>> {
    let session = state.services.sessions.get(id).await?;
    Ok(Json(session))
}

/// Upcoming approved sessions
#[utoipa::path(
    get,
    path = "/sessions/upcoming",
    tag = "sessions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Upcoming sessions", body = Vec<SessionDetails>)
    )
)]
pub async fn list_upcoming_sessions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<SessionDetails>>> {
    let sessions = state.services.sessions.list_upcoming().await?;
    Ok(Json(sessions))
}

/// The caller's own sessions
#[utoipa::path(
    get,
    path = "/sessions/mine",
    tag = "sessions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own sessions", body = Vec<LabSession>)
    )
)]
pub async fn list_my_sessions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LabSession>>> {
    let sessions = state.services.sessions.list_mine(&claims).await?;
    Ok(Json(sessions))
}

/// Pending sessions awaiting a decision
#[utoipa::path(
    get,
    path = "/sessions/pending",
    tag = "sessions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending sessions", body = Vec<LabSession>),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_pending_sessions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LabSession>>> {
    let sessions = state.services.sessions.list_pending(&claims).await?;
    Ok(Json(sessions))
}

/// Approve a pending session
#[utoipa::path(
    post,
    path = "/sessions/{id}/approve",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session approved", body = LabSession),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Lab taken or session no longer pending")
    )
)]
pub async fn approve_session(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LabSession>> {
    let session = state.services.sessions.approve(&claims, id).await?;
    Ok(Json(session))
}

/// Reject a pending session
#[utoipa::path(
    post,
    path = "/sessions/{id}/reject",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session rejected", body = LabSession),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session no longer pending")
    )
)]
pub async fn reject_session(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LabSession>> {
    let session = state.services.sessions.reject(&claims, id).await?;
    Ok(Json(session))
}

/// Cancel an approved session
#[utoipa::path(
    post,
    path = "/sessions/{id}/cancel",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID")
    ),
    request_body = CancelSessionRequest,
    responses(
        (status = 200, description = "Session cancelled", body = LabSession),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Too late to cancel or session not approved")
    )
)]
pub async fn cancel_session(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<CancelSessionRequest>,
) -> AppResult<Json<LabSession>> {
    let session = state
        .services
        .sessions
        .cancel(&claims, id, request.reason.as_deref())
        .await?;
    Ok(Json(session))
}

/// Register the calling student on a session roster
#[utoipa::path(
    post,
    path = "/sessions/{id}/join",
    tag = "sessions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID")
    ),
    responses(
        (status = 204, description = "Registered"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session not approved")
    )
)]
pub async fn join_session(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.sessions.join(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Approve several sessions at once
#[utoipa::path(
    post,
    path = "/sessions/bulk-approve",
    tag = "sessions",
    security(("bearer_auth" = [])),
    request_body = BulkSessionRequest,
    responses(
        (status = 200, description = "Per-item outcome", body = BulkOutcome)
    )
)]
pub async fn bulk_approve_sessions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkSessionRequest>,
) -> AppResult<Json<BulkOutcome>> {
    let outcome = state
        .services
        .sessions
        .bulk_approve(&claims, &request.ids)
        .await?;
    Ok(Json(outcome))
}

/// Cancel several sessions at once
#[utoipa::path(
    post,
    path = "/sessions/bulk-cancel",
    tag = "sessions",
    security(("bearer_auth" = [])),
    request_body = BulkSessionRequest,
    responses(
        (status = 200, description = "Per-item outcome", body = BulkOutcome)
    )
)]
pub async fn bulk_cancel_sessions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkSessionRequest>,
) -> AppResult<Json<BulkOutcome>> {
    let outcome = state
        .services
        .sessions
        .bulk_cancel(&claims, &request.ids, request.reason.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// Record attendance for one student on a session
#[utoipa::path(
    post,
    path = "/sessions/{id}/attendance/{student_id}",
    tag = "attendance",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID"),
        ("student_id" = i32, Path, description = "Student user ID")
    ),
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = SessionAttendance),
        (status = 404, description = "Session or student not found"),
        (status = 409, description = "Session not approved")
    )
)]
pub async fn mark_session_attendance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, student_id)): Path<(i32, i32)>,
    Json(mark): Json<MarkAttendance>,
) -> AppResult<Json<SessionAttendance>> {
    let record = state
        .services
        .sessions
        .mark_session_attendance(&claims, id, student_id, mark)
        .await?;
    Ok(Json(record))
}

/// Record attendance for a whole roster at once
#[utoipa::path(
    post,
    path = "/sessions/{id}/attendance",
    tag = "attendance",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID")
    ),
    request_body = BulkAttendanceRequest,
    responses(
        (status = 200, description = "Per-entry report", body = BulkAttendanceReport)
    )
)]
pub async fn bulk_session_attendance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<BulkAttendanceRequest>,
) -> AppResult<Json<BulkAttendanceReport>> {
    let report = state
        .services
        .sessions
        .bulk_attendance(&claims, id, request.entries)
        .await?;
    Ok(Json(report))
}

/// Attendance records for a session
#[utoipa::path(
    get,
    path = "/sessions/{id}/attendance",
    tag = "attendance",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Attendance records", body = Vec<SessionAttendance>),
        (status = 404, description = "Session not found")
    )
)]
pub async fn list_session_attendance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<SessionAttendance>>> {
    let records = state.services.sessions.list_attendance(&claims, id).await?;
    Ok(Json(records))
}

/// Record attendance for a computer booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/attendance",
    tag = "attendance",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = BookingAttendance),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking not approved")
    )
)]
pub async fn mark_booking_attendance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(mark): Json<MarkAttendance>,
) -> AppResult<Json<BookingAttendance>> {
    let record = state
        .services
        .sessions
        .mark_booking_attendance(&claims, id, mark)
        .await?;
    Ok(Json(record))
}
