//! Recurring session templates repository

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        recurring::{Cadence, RecurringSession},
        status::ReservationStatus,
        time_window::TimeWindow,
    },
};

#[derive(Clone)]
pub struct RecurringRepository {
    pool: Pool<Postgres>,
}

impl RecurringRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get template by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<RecurringSession> {
        sqlx::query_as::<_, RecurringSession>("SELECT * FROM recurring_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Recurring session with id {} not found", id))
            })
    }

    /// Create a new template in pending state
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        lab_id: i32,
        lecturer_id: i32,
        title: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        cadence: Cadence,
    ) -> AppResult<RecurringSession> {
        let template = sqlx::query_as::<_, RecurringSession>(
            r#"
            INSERT INTO recurring_sessions
                (lab_id, lecturer_id, title, start_date, end_date, start_time, end_time, cadence, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(lab_id)
        .bind(lecturer_id)
        .bind(title)
        .bind(start_date)
        .bind(end_date)
        .bind(start_time)
        .bind(end_time)
        .bind(cadence)
        .bind(ReservationStatus::Pending)
        .fetch_one(&self.pool)
        .await?;
        Ok(template)
    }

    /// Pending templates
    pub async fn list_pending(&self) -> AppResult<Vec<RecurringSession>> {
        let templates = sqlx::query_as::<_, RecurringSession>(
            "SELECT * FROM recurring_sessions WHERE status = $1 ORDER BY start_date",
        )
        .bind(ReservationStatus::Pending)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    /// Approved templates for a lab, excluding one (for cross-template
    /// conflict checks)
    pub async fn list_approved_for_lab(
        &self,
        lab_id: i32,
        exclude_id: Option<i32>,
    ) -> AppResult<Vec<RecurringSession>> {
        let templates = sqlx::query_as::<_, RecurringSession>(
            r#"
            SELECT * FROM recurring_sessions
            WHERE lab_id = $1 AND status = $2
              AND ($3::int IS NULL OR id != $3)
            "#,
        )
        .bind(lab_id)
        .bind(ReservationStatus::Approved)
        .bind(exclude_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    /// Templates owned by a lecturer
    pub async fn list_for_lecturer(&self, lecturer_id: i32) -> AppResult<Vec<RecurringSession>> {
        let templates = sqlx::query_as::<_, RecurringSession>(
            "SELECT * FROM recurring_sessions WHERE lecturer_id = $1 ORDER BY start_date DESC",
        )
        .bind(lecturer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    /// Approve a template and materialize one approved session per
    /// occurrence, all in one transaction so the expansion is all-or-nothing.
    pub async fn approve_and_materialize(
        &self,
        id: i32,
        occurrences: &[TimeWindow],
        now: DateTime<Utc>,
    ) -> AppResult<RecurringSession> {
        let mut tx = self.pool.begin().await?;

        let template = sqlx::query_as::<_, RecurringSession>(
            "SELECT * FROM recurring_sessions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recurring session with id {} not found", id)))?;

        template
            .status
            .validate_transition(ReservationStatus::Approved)?;

        let updated = sqlx::query_as::<_, RecurringSession>(
            "UPDATE recurring_sessions SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(ReservationStatus::Approved)
        .fetch_one(&mut *tx)
        .await?;

        for occurrence in occurrences {
            sqlx::query(
                r#"
                INSERT INTO lab_sessions
                    (lab_id, lecturer_id, title, start_time, end_time, status, approved_at, recurring_session_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(template.lab_id)
            .bind(template.lecturer_id)
            .bind(&template.title)
            .bind(occurrence.start)
            .bind(occurrence.end)
            .bind(ReservationStatus::Approved)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Remove a template outright (rejection and cancellation both delete;
    /// no tombstone is kept for templates)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM recurring_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Recurring session with id {} not found",
                id
            )));
        }
        Ok(())
    }
}
