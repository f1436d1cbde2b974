//! Lab sessions repository

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, ValidationError},
    models::{
        session::{LabSession, SessionDetails},
        status::ReservationStatus,
        time_window::TimeWindow,
    },
};

#[derive(Clone)]
pub struct SessionsRepository {
    pool: Pool<Postgres>,
}

impl SessionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get session by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<LabSession> {
        sqlx::query_as::<_, LabSession>("SELECT * FROM lab_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session with id {} not found", id)))
    }

    /// Whether an approved session in the lab overlaps the window
    pub async fn conflict_exists(
        &self,
        lab_id: i32,
        window: &TimeWindow,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM lab_sessions
                WHERE lab_id = $1
                  AND status = $2
                  AND start_time < $3 AND end_time > $4
                  AND ($5::int IS NULL OR id != $5)
            )
            "#,
        )
        .bind(lab_id)
        .bind(ReservationStatus::Approved)
        .bind(window.end)
        .bind(window.start)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Windows of approved sessions in a lab intersecting `[from, to]`
    pub async fn approved_windows_in_range(
        &self,
        lab_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<TimeWindow>> {
        let rows: Vec<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT start_time, end_time FROM lab_sessions
            WHERE lab_id = $1
              AND status = $2
              AND start_time < $3 AND end_time > $4
            ORDER BY start_time
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

    /// Create a new session in pending state
    pub async fn create(
        &self,
        lab_id: i32,
        lecturer_id: i32,
        title: &str,
        window: &TimeWindow,
    ) -> AppResult<LabSession> {
        let session = sqlx::query_as::<_, LabSession>(
            r#"
            INSERT INTO lab_sessions (lab_id, lecturer_id, title, start_time, end_time, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(lab_id)
        .bind(lecturer_id)
        .bind(title)
        .bind(window.start)
        .bind(window.end)
        .bind(ReservationStatus::Pending)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    /// Approve a session. Re-checks for overlapping approved sessions inside
    /// the transaction with the row locked, so the first approval wins. With
    /// `block_on_bookings` set, overlapping approved bookings in the lab also
    /// fail the approval inside the same transaction.
    pub async fn approve(
        &self,
        id: i32,
        now: DateTime<Utc>,
        block_on_bookings: bool,
    ) -> AppResult<LabSession> {
        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, LabSession>(
            "SELECT * FROM lab_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session with id {} not found", id)))?;

        session
            .status
            .validate_transition(ReservationStatus::Approved)?;

        let session_conflict: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM lab_sessions
                WHERE lab_id = $1
                  AND status = $2
                  AND start_time < $3 AND end_time > $4
                  AND id != $5
            )
            "#,
        )
        .bind(session.lab_id)
        .bind(ReservationStatus::Approved)
        .bind(session.end_time)
        .bind(session.start_time)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if session_conflict {
            return Err(ValidationError::SlotTaken("Lab".to_string()).into());
        }

        if block_on_bookings {
            let booking_conflict: bool = sqlx::query_scalar(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM computer_bookings b
                    JOIN computers c ON b.computer_id = c.id
                    WHERE c.lab_id = $1
                      AND b.status = $2
                      AND b.start_time < $3 AND b.end_time > $4
                )
                "#,
            )
            .bind(session.lab_id)
            .bind(ReservationStatus::Approved)
            .bind(session.end_time)
            .bind(session.start_time)
            .fetch_one(&mut *tx)
            .await?;

            if booking_conflict {
                return Err(AppError::Conflict(
                    "Approved bookings overlap this session in a small lab".to_string(),
                ));
            }
        }

        let updated = sqlx::query_as::<_, LabSession>(
            r#"
            UPDATE lab_sessions
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

    /// Tombstone a pending session as rejected
    pub async fn reject(&self, id: i32, now: DateTime<Utc>) -> AppResult<LabSession> {
        sqlx::query_as::<_, LabSession>(
            r#"
            UPDATE lab_sessions
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
        .ok_or_else(|| AppError::Conflict("Session is no longer pending".to_string()))
    }

    /// Tombstone an approved session as cancelled
    pub async fn cancel(
        &self,
        id: i32,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<LabSession> {
        sqlx::query_as::<_, LabSession>(
            r#"
            UPDATE lab_sessions
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
        .ok_or_else(|| AppError::Conflict("Only approved sessions can be cancelled".to_string()))
    }

    /// Pending sessions that have not yet ended
    pub async fn list_pending_future(&self, now: DateTime<Utc>) -> AppResult<Vec<LabSession>> {
        let sessions = sqlx::query_as::<_, LabSession>(
            r#"
            SELECT * FROM lab_sessions
            WHERE status = $1 AND end_time >= $2
            ORDER BY start_time
            "#,
        )
        .bind(ReservationStatus::Pending)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Approved sessions that have not yet ended, with display context
    pub async fn list_approved_future(&self, now: DateTime<Utc>) -> AppResult<Vec<SessionDetails>> {
        let sessions = sqlx::query_as::<_, SessionDetails>(
            r#"
            SELECT s.id, s.lab_id, l.name AS lab_name, s.lecturer_id,
                   u.username AS lecturer_username, s.title,
                   s.start_time, s.end_time, s.status,
                   (SELECT COUNT(*) FROM session_attendees a WHERE a.session_id = s.id) AS attendee_count
            FROM lab_sessions s
            JOIN labs l ON s.lab_id = l.id
            JOIN users u ON s.lecturer_id = u.id
            WHERE s.status = $1 AND s.end_time >= $2
            ORDER BY s.start_time
            "#,
        )
        .bind(ReservationStatus::Approved)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Sessions owned by a lecturer, newest first
    pub async fn list_for_lecturer(&self, lecturer_id: i32) -> AppResult<Vec<LabSession>> {
        let sessions = sqlx::query_as::<_, LabSession>(
            "SELECT * FROM lab_sessions WHERE lecturer_id = $1 ORDER BY start_time DESC",
        )
        .bind(lecturer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Register a student on a session roster (idempotent)
    pub async fn add_attendee(&self, session_id: i32, student_id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO session_attendees (session_id, student_id)
            VALUES ($1, $2)
            ON CONFLICT (session_id, student_id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(student_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Student IDs registered on a session
    pub async fn attendee_ids(&self, session_id: i32) -> AppResult<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT student_id FROM session_attendees WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Delete future child sessions of a recurring template, returning the
    /// removed rows paired with their attendee rosters. The rosters are read
    /// before the delete, in the same transaction; the delete cascades over
    /// session_attendees, so reading them afterwards would find nothing.
    pub async fn delete_future_children(
        &self,
        recurring_session_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<(LabSession, Vec<i32>)>> {
        let mut tx = self.pool.begin().await?;

        let sessions = sqlx::query_as::<_, LabSession>(
            r#"
            SELECT * FROM lab_sessions
            WHERE recurring_session_id = $1 AND start_time > $2
            FOR UPDATE
            "#,
        )
        .bind(recurring_session_id)
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        let mut removed = Vec::with_capacity(sessions.len());
        for session in sessions {
            let attendees: Vec<i32> = sqlx::query_scalar(
                "SELECT student_id FROM session_attendees WHERE session_id = $1",
            )
            .bind(session.id)
            .fetch_all(&mut *tx)
            .await?;
            removed.push((session, attendees));
        }

        sqlx::query("DELETE FROM lab_sessions WHERE recurring_session_id = $1 AND start_time > $2")
            .bind(recurring_session_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removed)
    }

    pub async fn set_approval_email_sent(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE lab_sessions SET approval_email_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_rejection_email_sent(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE lab_sessions SET rejection_email_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_cancellation_email_sent(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE lab_sessions SET cancellation_email_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
