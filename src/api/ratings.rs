//! Student rating endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::rating::{RateStudent, RatingSummary, StudentRating},
};

use super::AuthenticatedUser;

/// Rate the student who owns a booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/rating",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    request_body = RateStudent,
    responses(
        (status = 200, description = "Rating recorded", body = StudentRating),
        (status = 400, description = "Score off the 1-5 scale"),
        (status = 403, description = "Not an admin of the lab"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn rate_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<RateStudent>,
) -> AppResult<Json<StudentRating>> {
    let rating = state.services.ratings.rate_booking(&claims, id, request).await?;
    Ok(Json(rating))
}

/// Rate a student for a session
#[utoipa::path(
    post,
    path = "/sessions/{id}/ratings/{student_id}",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Session ID"),
        ("student_id" = i32, Path, description = "Student user ID")
    ),
    request_body = RateStudent,
    responses(
        (status = 200, description = "Rating recorded", body = StudentRating),
        (status = 400, description = "Score off the 1-5 scale"),
        (status = 403, description = "Not an admin of the lab"),
        (status = 404, description = "Session or student not found")
    )
)]
pub async fn rate_session_student(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, student_id)): Path<(i32, i32)>,
    Json(request): Json<RateStudent>,
) -> AppResult<Json<StudentRating>> {
    let rating = state
        .services
        .ratings
        .rate_session_student(&claims, id, student_id, request)
        .await?;
    Ok(Json(rating))
}

/// Ratings a student has received
#[utoipa::path(
    get,
    path = "/students/{id}/ratings",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Student user ID")
    ),
    responses(
        (status = 200, description = "Ratings, newest first", body = Vec<StudentRating>),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn list_student_ratings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<StudentRating>>> {
    let ratings = state.services.ratings.list_for_student(&claims, id).await?;
    Ok(Json(ratings))
}

/// Average score and rating count for a student
#[utoipa::path(
    get,
    path = "/students/{id}/rating-summary",
    tag = "ratings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Student user ID")
    ),
    responses(
        (status = 200, description = "Aggregate rating", body = RatingSummary),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn student_rating_summary(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RatingSummary>> {
    let summary = state.services.ratings.summary(&claims, id).await?;
    Ok(Json(summary))
}
