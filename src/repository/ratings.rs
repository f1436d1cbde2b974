//! Student ratings repository

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::rating::{RatingSummary, StudentRating},
};

#[derive(Clone)]
pub struct RatingsRepository {
    pool: Pool<Postgres>,
}

impl RatingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record or revise a rating tied to a booking. One rating per
    /// (student, rater, booking); rating again updates the score.
    pub async fn upsert_for_booking(
        &self,
        student_id: i32,
        rated_by: i32,
        booking_id: i32,
        score: i16,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<StudentRating> {
        let rating = sqlx::query_as::<_, StudentRating>(
            r#"
            INSERT INTO student_ratings (student_id, rated_by, booking_id, score, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (student_id, rated_by, booking_id) WHERE booking_id IS NOT NULL DO UPDATE
            SET score = EXCLUDED.score,
                comment = EXCLUDED.comment,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(rated_by)
        .bind(booking_id)
        .bind(score)
        .bind(comment)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(rating)
    }

    /// Record or revise a rating tied to a session
    pub async fn upsert_for_session(
        &self,
        student_id: i32,
        rated_by: i32,
        session_id: i32,
        score: i16,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<StudentRating> {
        let rating = sqlx::query_as::<_, StudentRating>(
            r#"
            INSERT INTO student_ratings (student_id, rated_by, session_id, score, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (student_id, rated_by, session_id) WHERE session_id IS NOT NULL DO UPDATE
            SET score = EXCLUDED.score,
                comment = EXCLUDED.comment,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(rated_by)
        .bind(session_id)
        .bind(score)
        .bind(comment)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(rating)
    }

    /// Average score and rating count for a student
    pub async fn summary_for_student(&self, student_id: i32) -> AppResult<RatingSummary> {
        let summary = sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT $1::int AS student_id,
                   AVG(score)::float8 AS average_score,
                   COUNT(*) AS rating_count
            FROM student_ratings
            WHERE student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }

    /// All ratings for a student, newest first
    pub async fn list_for_student(&self, student_id: i32) -> AppResult<Vec<StudentRating>> {
        let ratings = sqlx::query_as::<_, StudentRating>(
            "SELECT * FROM student_ratings WHERE student_id = $1 ORDER BY created_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }
}
