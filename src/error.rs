//! Error types for LabReserve server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Validation failures raised before any state change is persisted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("End time must be after start time")]
    EndBeforeStart,

    #[error("Start time cannot be in the past")]
    PastStartTime,

    #[error("{0} is already booked for this time slot")]
    SlotTaken(String),

    #[error("Cannot book lab session when more than {0} computers are already booked")]
    TooManyConcurrentBookings(i64),

    #[error("End date must be on or after start date")]
    InvalidDateRange,

    #[error("Recurring session conflicts with existing bookings on: {}", .0.join(", "))]
    RecurrenceConflict(Vec<String>),

    #[error("Illegal transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    #[error("Score must be between 1 and 5")]
    ScoreOutOfRange,
}

impl ValidationError {
    /// Stable machine-readable tag for API clients
    pub fn tag(&self) -> &'static str {
        match self {
            ValidationError::EndBeforeStart => "end_before_start",
            ValidationError::PastStartTime => "past_start_time",
            ValidationError::SlotTaken(_) => "slot_taken",
            ValidationError::TooManyConcurrentBookings(_) => "too_many_concurrent_bookings",
            ValidationError::InvalidDateRange => "invalid_date_range",
            ValidationError::RecurrenceConflict(_) => "recurrence_conflict",
            ValidationError::IllegalTransition { .. } => "illegal_transition",
            ValidationError::ScoreOutOfRange => "score_out_of_range",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ValidationError::SlotTaken(_)
            | ValidationError::TooManyConcurrentBookings(_)
            | ValidationError::RecurrenceConflict(_)
            | ValidationError::IllegalTransition { .. } => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Conflicting occurrence dates, only set for recurrence conflicts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_dates: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, conflict_dates) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, "not_authenticated", msg.clone(), None)
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, "not_authorized", msg.clone(), None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            AppError::Validation(e) => {
                let dates = match e {
                    ValidationError::RecurrenceConflict(dates) => Some(dates.clone()),
                    _ => None,
                };
                (e.status(), e.tag(), e.to_string(), dates)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "db_failure",
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failure",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            conflict_dates,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
