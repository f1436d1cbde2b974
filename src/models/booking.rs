//! Computer booking model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::status::ReservationStatus;
use super::time_window::TimeWindow;

/// Computer booking from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ComputerBooking {
    pub id: i32,
    pub computer_id: i32,
    pub student_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Opaque code shown to the student at check-in
    pub booking_code: Uuid,
    pub status: ReservationStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub extension_requested: bool,
    pub extension_approved: bool,
    pub extended_at: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
    pub approval_email_sent: bool,
    pub rejection_email_sent: bool,
    pub cancellation_email_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl ComputerBooking {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Booking with display context for lists and emails
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookingDetails {
    pub id: i32,
    pub computer_id: i32,
    pub computer_number: i32,
    pub lab_id: i32,
    pub lab_name: String,
    pub student_id: i32,
    pub student_username: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub booking_code: Uuid,
    pub status: ReservationStatus,
}

/// Create booking request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBooking {
    pub computer_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Outcome of a bulk approve/cancel pass
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: usize,
}
