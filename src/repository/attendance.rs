//! Attendance repository

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::attendance::{AttendanceStatus, BookingAttendance, SessionAttendance},
};

#[derive(Clone)]
pub struct AttendanceRepository {
    pool: Pool<Postgres>,
}

impl AttendanceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record attendance for a booking (one record per booking; re-marking
    /// overwrites the status). Check-in is stamped only for statuses where
    /// the student showed up, and an existing check-in is never overwritten.
    pub async fn upsert_booking_attendance(
        &self,
        booking_id: i32,
        status: AttendanceStatus,
        notes: Option<&str>,
        checked_by: i32,
        now: DateTime<Utc>,
    ) -> AppResult<BookingAttendance> {
        let check_in = status.records_check_in().then_some(now);
        let record = sqlx::query_as::<_, BookingAttendance>(
            r#"
            INSERT INTO booking_attendance (booking_id, status, check_in_time, notes, checked_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (booking_id) DO UPDATE
            SET status = EXCLUDED.status,
                check_in_time = COALESCE(booking_attendance.check_in_time, EXCLUDED.check_in_time),
                notes = EXCLUDED.notes,
                checked_by = EXCLUDED.checked_by,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(status)
        .bind(check_in)
        .bind(notes)
        .bind(checked_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    /// Record attendance for a (session, student) pair; same check-in rules
    /// as bookings
    pub async fn upsert_session_attendance(
        &self,
        session_id: i32,
        student_id: i32,
        status: AttendanceStatus,
        notes: Option<&str>,
        checked_by: i32,
        now: DateTime<Utc>,
    ) -> AppResult<SessionAttendance> {
        let check_in = status.records_check_in().then_some(now);
        let record = sqlx::query_as::<_, SessionAttendance>(
            r#"
            INSERT INTO session_attendance (session_id, student_id, status, check_in_time, notes, checked_by, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (session_id, student_id) DO UPDATE
            SET status = EXCLUDED.status,
                check_in_time = COALESCE(session_attendance.check_in_time, EXCLUDED.check_in_time),
                notes = EXCLUDED.notes,
                checked_by = EXCLUDED.checked_by,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(student_id)
        .bind(status)
        .bind(check_in)
        .bind(notes)
        .bind(checked_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    /// Attendance records for a session
    pub async fn list_for_session(&self, session_id: i32) -> AppResult<Vec<SessionAttendance>> {
        let records = sqlx::query_as::<_, SessionAttendance>(
            "SELECT * FROM session_attendance WHERE session_id = $1 ORDER BY student_id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
