//! Student rating service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        rating::{RateStudent, RatingSummary, StudentRating},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RatingsService {
    repository: Repository,
}

impl RatingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn authorize_lab_admin(&self, claims: &UserClaims, lab_id: i32) -> AppResult<()> {
        claims.require_admin()?;
        if claims.is_super_admin {
            return Ok(());
        }
        if self
            .repository
            .users
            .manages_lab(claims.user_id, lab_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You do not manage this lab".to_string(),
            ))
        }
    }

    /// Rate the student who owns a booking. Rating the same booking again
    /// revises the earlier score.
    pub async fn rate_booking(
        &self,
        claims: &UserClaims,
        booking_id: i32,
        request: RateStudent,
    ) -> AppResult<StudentRating> {
        request.validate()?;

        let booking = self.repository.bookings.get_by_id(booking_id).await?;
        let computer = self.repository.labs.get_computer(booking.computer_id).await?;
        self.authorize_lab_admin(claims, computer.lab_id).await?;

        let rating = self
            .repository
            .ratings
            .upsert_for_booking(
                booking.student_id,
                claims.user_id,
                booking_id,
                request.score,
                request.comment.as_deref(),
                Utc::now(),
            )
            .await?;

        tracing::info!(
            booking_id,
            student_id = booking.student_id,
            score = rating.score,
            "student rated for booking"
        );

        Ok(rating)
    }

    /// Rate a student for a session they attended
    pub async fn rate_session_student(
        &self,
        claims: &UserClaims,
        session_id: i32,
        student_id: i32,
        request: RateStudent,
    ) -> AppResult<StudentRating> {
        request.validate()?;

        let session = self.repository.sessions.get_by_id(session_id).await?;
        self.authorize_lab_admin(claims, session.lab_id).await?;

        let student = self.repository.users.get_student(student_id).await?;
        let rating = self
            .repository
            .ratings
            .upsert_for_session(
                student.id,
                claims.user_id,
                session_id,
                request.score,
                request.comment.as_deref(),
                Utc::now(),
            )
            .await?;

        tracing::info!(
            session_id,
            student_id = student.id,
            score = rating.score,
            "student rated for session"
        );

        Ok(rating)
    }

    /// Average score and rating count for a student (admin view)
    pub async fn summary(&self, claims: &UserClaims, student_id: i32) -> AppResult<RatingSummary> {
        claims.require_admin()?;
        self.repository.users.get_student(student_id).await?;
        self.repository.ratings.summary_for_student(student_id).await
    }

    /// All ratings for a student, newest first (admin view)
    pub async fn list_for_student(
        &self,
        claims: &UserClaims,
        student_id: i32,
    ) -> AppResult<Vec<StudentRating>> {
        claims.require_admin()?;
        self.repository.users.get_student(student_id).await?;
        self.repository.ratings.list_for_student(student_id).await
    }
}
