//! Student ratings recorded by lab admins

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::ValidationError;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

/// One admin's rating of a student, tied to either a booking or a session.
/// Exactly one of `booking_id` and `session_id` is set; rating the same
/// student again for the same booking or session revises the earlier score.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentRating {
    pub id: i32,
    pub student_id: i32,
    /// Admin who gave the rating
    pub rated_by: i32,
    pub booking_id: Option<i32>,
    pub session_id: Option<i32>,
    pub score: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rate-student request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RateStudent {
    pub score: i16,
    pub comment: Option<String>,
}

impl RateStudent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&self.score) {
            return Err(ValidationError::ScoreOutOfRange);
        }
        Ok(())
    }
}

/// Aggregate rating for a student across all raters
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct RatingSummary {
    pub student_id: i32,
    /// None until the student has been rated at least once
    pub average_score: Option<f64>,
    pub rating_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(score: i16) -> RateStudent {
        RateStudent {
            score,
            comment: None,
        }
    }

    #[test]
    fn accepts_scores_on_the_scale() {
        assert!(rate(1).validate().is_ok());
        assert!(rate(3).validate().is_ok());
        assert!(rate(5).validate().is_ok());
    }

    #[test]
    fn rejects_scores_off_the_scale() {
        assert_eq!(rate(0).validate(), Err(ValidationError::ScoreOutOfRange));
        assert_eq!(rate(6).validate(), Err(ValidationError::ScoreOutOfRange));
        assert_eq!(rate(-1).validate(), Err(ValidationError::ScoreOutOfRange));
    }
}
