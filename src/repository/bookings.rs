//! Computer bookings repository, including the availability index queries

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, ValidationError},
    models::{
        booking::{BookingDetails, ComputerBooking},
        status::ReservationStatus,
        time_window::TimeWindow,
    },
};

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get booking by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<ComputerBooking> {
        sqlx::query_as::<_, ComputerBooking>("SELECT * FROM computer_bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    /// Availability check for a computer: true if an approved booking on the
    /// same computer or an approved session on the computer's lab overlaps
    /// the window. Overlap is strict half-open intersection, so touching
    /// endpoints are free.
    pub async fn conflict_exists(
        &self,
        computer_id: i32,
        lab_id: i32,
        window: &TimeWindow,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let booking_conflict: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM computer_bookings
                WHERE computer_id = $1
                  AND status = $2
                  AND start_time < $3 AND end_time > $4
                  AND ($5::int IS NULL OR id != $5)
            )
            "#,
        )
        .bind(computer_id)
        .bind(ReservationStatus::Approved)
        .bind(window.end)
        .bind(window.start)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        if booking_conflict {
            return Ok(true);
        }

        let session_conflict: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM lab_sessions
                WHERE lab_id = $1
                  AND status = $2
                  AND start_time < $3 AND end_time > $4
            )
            "#,
        )
        .bind(lab_id)
        .bind(ReservationStatus::Approved)
        .bind(window.end)
        .bind(window.start)
        .fetch_one(&self.pool)
        .await?;

        Ok(session_conflict)
    }

    /// Approved bookings overlapping a window in a lab (the concurrent
    /// booking cap for pending sessions)
    pub async fn count_approved_overlapping_in_lab(
        &self,
        lab_id: i32,
        window: &TimeWindow,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM computer_bookings b
            JOIN computers c ON b.computer_id = c.id
            WHERE c.lab_id = $1
              AND b.status = $2
              AND b.start_time < $3 AND b.end_time > $4
            "#,
        )
        .bind(lab_id)
        .bind(ReservationStatus::Approved)
        .bind(window.end)
        .bind(window.start)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Windows of approved bookings on a computer intersecting `[from, to]`
    pub async fn approved_windows_for_computer(
        &self,
        computer_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<TimeWindow>> {
        let rows: Vec<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT start_time, end_time FROM computer_bookings
            WHERE computer_id = $1
              AND status = $2
              AND start_time < $3 AND end_time > $4
            ORDER BY start_time
            "#,
        )
        .bind(computer_id)
        .bind(ReservationStatus::Approved)
        .bind(to)
        .bind(from)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(start, end)| TimeWindow { start, end })
            .collect())
    }

    /// Windows of approved bookings anywhere in a lab intersecting `[from, to]`
    pub async fn approved_windows_in_lab(
        &self,
        lab_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<TimeWindow>> {
        let rows: Vec<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT b.start_time, b.end_time FROM computer_bookings b
            JOIN computers c ON b.computer_id = c.id
            WHERE c.lab_id = $1
              AND b.status = $2
              AND b.start_time < $3 AND b.end_time > $4
            ORDER BY b.start_time
            "#,
        )
        .bind(lab_id)
        .bind(ReservationStatus::Approved)
        .bind(to)
        .bind(from)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(start, end)| TimeWindow { start, end })
            .collect())
    }

    /// Create a new booking in pending state
    pub async fn create(
        &self,
        computer_id: i32,
        student_id: i32,
        window: &TimeWindow,
        booking_code: Uuid,
    ) -> AppResult<ComputerBooking> {
        let booking = sqlx::query_as::<_, ComputerBooking>(
            r#"
            INSERT INTO computer_bookings (computer_id, student_id, start_time, end_time, booking_code, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(computer_id)
        .bind(student_id)
        .bind(window.start)
        .bind(window.end)
        .bind(booking_code)
        .bind(ReservationStatus::Pending)
        .fetch_one(&self.pool)
        .await?;
        Ok(booking)
    }

    /// Approve a booking. The conflict check re-runs inside the transaction
    /// with the booking row locked, so of two overlapping pending requests
    /// the first approval wins and the second fails with SlotTaken.
    pub async fn approve(&self, id: i32, now: DateTime<Utc>) -> AppResult<ComputerBooking> {
        let mut tx = self.pool.begin().await?;

        let booking = sqlx::query_as::<_, ComputerBooking>(
            "SELECT * FROM computer_bookings WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))?;

        booking
            .status
            .validate_transition(ReservationStatus::Approved)?;

        let lab_id: i32 = sqlx::query_scalar("SELECT lab_id FROM computers WHERE id = $1")
            .bind(booking.computer_id)
            .fetch_one(&mut *tx)
            .await?;

        let booking_conflict: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM computer_bookings
                WHERE computer_id = $1
                  AND status = $2
                  AND start_time < $3 AND end_time > $4
                  AND id != $5
            )
            "#,
        )
        .bind(booking.computer_id)
        .bind(ReservationStatus::Approved)
        .bind(booking.end_time)
        .bind(booking.start_time)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if booking_conflict {
            return Err(ValidationError::SlotTaken("Computer".to_string()).into());
        }

        let session_conflict: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM lab_sessions
                WHERE lab_id = $1
                  AND status = $2
                  AND start_time < $3 AND end_time > $4
            )
            "#,
        )
        .bind(lab_id)
        .bind(ReservationStatus::Approved)
        .bind(booking.end_time)
        .bind(booking.start_time)
        .fetch_one(&mut *tx)
        .await?;

        if session_conflict {
            return Err(ValidationError::SlotTaken("Lab".to_string()).into());
        }

        let updated = sqlx::query_as::<_, ComputerBooking>(
            r#"
            UPDATE computer_bookings
            SET status = $2, approved_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ReservationStatus::Approved)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Tombstone a pending booking as rejected. Guarded on the current
    /// status so a concurrent decision cannot be overwritten.
    pub async fn reject(&self, id: i32, now: DateTime<Utc>) -> AppResult<ComputerBooking> {
        sqlx::query_as::<_, ComputerBooking>(
            r#"
            UPDATE computer_bookings
            SET status = $2, cancelled_at = $3
            WHERE id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ReservationStatus::Rejected)
        .bind(now)
        .bind(ReservationStatus::Pending)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("Booking is no longer pending".to_string()))
    }

    /// Tombstone an approved booking as cancelled
    pub async fn cancel(
        &self,
        id: i32,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<ComputerBooking> {
        sqlx::query_as::<_, ComputerBooking>(
            r#"
            UPDATE computer_bookings
            SET status = $2, cancelled_at = $3, cancellation_reason = $4
            WHERE id = $1 AND status = $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(ReservationStatus::Cancelled)
        .bind(now)
        .bind(reason)
        .bind(ReservationStatus::Approved)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("Only approved bookings can be cancelled".to_string()))
    }

    /// Push the end time back by `minutes` and set the extension flags
    pub async fn extend(
        &self,
        id: i32,
        new_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<ComputerBooking> {
        sqlx::query_as::<_, ComputerBooking>(
            r#"
            UPDATE computer_bookings
            SET end_time = $2, extension_requested = TRUE, extension_approved = TRUE, extended_at = $3
            WHERE id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(new_end)
        .bind(now)
        .bind(ReservationStatus::Approved)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("Only approved bookings can be extended".to_string()))
    }

    /// Cancel every approved booking in a lab overlapping a window,
    /// returning the displaced rows (used when a session is approved)
    pub async fn displace_approved_in_lab(
        &self,
        lab_id: i32,
        window: &TimeWindow,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ComputerBooking>> {
        let displaced = sqlx::query_as::<_, ComputerBooking>(
            r#"
            UPDATE computer_bookings
            SET status = $2, cancelled_at = $5, cancellation_reason = 'Displaced by an approved lab session'
            WHERE computer_id IN (SELECT id FROM computers WHERE lab_id = $1)
              AND status = $3
              AND start_time < $4 AND end_time > $6
            RETURNING *
            "#,
        )
        .bind(lab_id)
        .bind(ReservationStatus::Cancelled)
        .bind(ReservationStatus::Approved)
        .bind(window.end)
        .bind(now)
        .bind(window.start)
        .fetch_all(&self.pool)
        .await?;
        Ok(displaced)
    }

    /// Pending bookings that have not yet ended, with display context
    pub async fn list_pending_details(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<BookingDetails>> {
        let bookings = sqlx::query_as::<_, BookingDetails>(
            r#"
            SELECT b.id, b.computer_id, c.computer_number, c.lab_id, l.name AS lab_name,
                   b.student_id, u.username AS student_username,
                   b.start_time, b.end_time, b.booking_code, b.status
            FROM computer_bookings b
            JOIN computers c ON b.computer_id = c.id
            JOIN labs l ON c.lab_id = l.id
            JOIN users u ON b.student_id = u.id
            WHERE b.status = $1 AND b.end_time >= $2
            ORDER BY b.start_time
            "#,
        )
        .bind(ReservationStatus::Pending)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Bookings for a student, newest first
    pub async fn list_for_student(&self, student_id: i32) -> AppResult<Vec<ComputerBooking>> {
        let bookings = sqlx::query_as::<_, ComputerBooking>(
            "SELECT * FROM computer_bookings WHERE student_id = $1 ORDER BY start_time DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Approved bookings ending inside (from, to] that have no reminder yet
    pub async fn list_ending_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ComputerBooking>> {
        let bookings = sqlx::query_as::<_, ComputerBooking>(
            r#"
            SELECT * FROM computer_bookings
            WHERE status = $1
              AND end_time > $2 AND end_time <= $3
              AND reminder_sent = FALSE
            "#,
        )
        .bind(ReservationStatus::Approved)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    pub async fn set_reminder_sent(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE computer_bookings SET reminder_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_approval_email_sent(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE computer_bookings SET approval_email_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_rejection_email_sent(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE computer_bookings SET rejection_email_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_cancellation_email_sent(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE computer_bookings SET cancellation_email_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
