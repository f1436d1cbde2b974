//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{bookings, health, labs, notifications, ratings, recurring, sessions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LabReserve API",
        version = "1.0.0",
        description = "University computer lab scheduling REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Labs
        labs::list_labs,
        labs::get_lab,
        labs::list_computers,
        labs::list_timeslots,
        // Bookings
        bookings::create_booking,
        bookings::get_booking,
        bookings::list_my_bookings,
        bookings::list_pending_bookings,
        bookings::approve_booking,
        bookings::reject_booking,
        bookings::cancel_booking,
        bookings::extend_booking,
        bookings::bulk_approve_bookings,
        bookings::bulk_cancel_bookings,
        // Sessions
        sessions::create_session,
        sessions::get_session,
        sessions::list_upcoming_sessions,
        sessions::list_my_sessions,
        sessions::list_pending_sessions,
        sessions::approve_session,
        sessions::reject_session,
        sessions::cancel_session,
        sessions::join_session,
        sessions::bulk_approve_sessions,
        sessions::bulk_cancel_sessions,
        // Attendance
        sessions::mark_session_attendance,
        sessions::bulk_session_attendance,
        sessions::list_session_attendance,
        sessions::mark_booking_attendance,
        // Ratings
        ratings::rate_booking,
        ratings::rate_session_student,
        ratings::list_student_ratings,
        ratings::student_rating_summary,
        // Recurring
        recurring::create_recurring,
        recurring::get_recurring,
        recurring::list_my_recurring,
        recurring::list_pending_recurring,
        recurring::approve_recurring,
        recurring::reject_recurring,
        recurring::cancel_recurring,
        recurring::bulk_approve_recurring,
        // Notifications
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_all_read,
    ),
    components(
        schemas(
            // Labs
            crate::models::lab::Lab,
            crate::models::lab::Computer,
            crate::models::lab::ComputerStatus,
            crate::models::timeslot::Timeslot,
            // Bookings
            crate::models::booking::ComputerBooking,
            crate::models::booking::BookingDetails,
            crate::models::booking::CreateBooking,
            crate::models::booking::BulkOutcome,
            bookings::CancelRequest,
            bookings::BulkRequest,
            // Sessions
            crate::models::session::LabSession,
            crate::models::session::SessionDetails,
            crate::models::session::CreateSession,
            sessions::CancelSessionRequest,
            sessions::BulkSessionRequest,
            sessions::BulkAttendanceRequest,
            // Attendance
            crate::models::attendance::AttendanceStatus,
            crate::models::attendance::BookingAttendance,
            crate::models::attendance::SessionAttendance,
            crate::models::attendance::MarkAttendance,
            crate::models::attendance::BulkAttendanceEntry,
            crate::models::attendance::AttendanceFailure,
            crate::models::attendance::BulkAttendanceReport,
            // Ratings
            crate::models::rating::StudentRating,
            crate::models::rating::RateStudent,
            crate::models::rating::RatingSummary,
            // Recurring
            crate::models::recurring::RecurringSession,
            crate::models::recurring::CreateRecurringSession,
            crate::models::recurring::Cadence,
            recurring::BulkRecurringRequest,
            // Notifications
            crate::models::notification::Notification,
            crate::models::notification::NotificationKind,
            notifications::UnreadCountResponse,
            notifications::MarkReadResponse,
            // Shared
            crate::models::status::ReservationStatus,
            crate::models::user::User,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "labs", description = "Labs and computers"),
        (name = "bookings", description = "Computer bookings"),
        (name = "sessions", description = "Lab sessions"),
        (name = "attendance", description = "Attendance tracking"),
        (name = "ratings", description = "Student ratings"),
        (name = "recurring", description = "Recurring session templates"),
        (name = "notifications", description = "In-app notifications")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
