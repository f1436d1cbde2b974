//! Lab session model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::status::ReservationStatus;
use super::time_window::TimeWindow;

/// Lab session (whole-room reservation by a lecturer)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LabSession {
    pub id: i32,
    pub lab_id: i32,
    pub lecturer_id: i32,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub approval_email_sent: bool,
    pub rejection_email_sent: bool,
    pub cancellation_email_sent: bool,
    /// Set when this session was materialized from a recurring template
    pub recurring_session_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl LabSession {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Create session request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSession {
    pub lab_id: i32,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Session with display context
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SessionDetails {
    pub id: i32,
    pub lab_id: i32,
    pub lab_name: String,
    pub lecturer_id: i32,
    pub lecturer_username: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub attendee_count: i64,
}
