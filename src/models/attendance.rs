//! Attendance records for bookings and sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Attendance status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum AttendanceStatus {
    Present = 0,
    Absent = 1,
    Late = 2,
    Excused = 3,
}

impl AttendanceStatus {
    /// Only statuses where the student actually showed up carry a check-in
    /// time
    pub fn records_check_in(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

impl From<i16> for AttendanceStatus {
    fn from(v: i16) -> Self {
        match v {
            0 => AttendanceStatus::Present,
            2 => AttendanceStatus::Late,
            3 => AttendanceStatus::Excused,
            _ => AttendanceStatus::Absent,
        }
    }
}

impl From<AttendanceStatus> for i16 {
    fn from(s: AttendanceStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Excused => "Excused",
        };
        write!(f, "{}", label)
    }
}

/// One attendance record per computer booking
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookingAttendance {
    pub id: i32,
    pub booking_id: i32,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Admin who recorded the attendance
    pub checked_by: i32,
    pub updated_at: DateTime<Utc>,
}

/// One attendance record per (session, student)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SessionAttendance {
    pub id: i32,
    pub session_id: i32,
    pub student_id: i32,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub checked_by: i32,
    pub updated_at: DateTime<Utc>,
}

/// Mark attendance request (single record)
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkAttendance {
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// One entry of a bulk session attendance check
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkAttendanceEntry {
    pub student_id: i32,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Per-entry failure from a bulk attendance check
#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceFailure {
    pub student_id: i32,
    pub reason: String,
}

/// Report of a bulk attendance check; per-entry failures never abort the batch
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct BulkAttendanceReport {
    pub recorded: usize,
    pub failures: Vec<AttendanceFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_showing_up_records_a_check_in() {
        assert!(AttendanceStatus::Present.records_check_in());
        assert!(AttendanceStatus::Late.records_check_in());
        assert!(!AttendanceStatus::Absent.records_check_in());
        assert!(!AttendanceStatus::Excused.records_check_in());
    }
}
