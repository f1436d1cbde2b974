//! LabReserve Server - University computer lab scheduling

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labreserve_server::{
    api, config::AppConfig, repository::Repository, services::Services, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("labreserve_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LabReserve Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), config.email.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        repository: Arc::new(repository),
        services: Arc::new(services),
    };

    // Background reminder loop: students are warned a few minutes before
    // their booking ends
    let reminder_services = state.services.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            match reminder_services.bookings.send_ending_reminders().await {
                Ok(0) => {}
                Ok(sent) => tracing::info!(sent, "ending reminders sent"),
                Err(e) => tracing::warn!(error = %e, "reminder pass failed"),
            }
        }
    });

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Labs
        .route("/labs", get(api::labs::list_labs))
        .route("/labs/:id", get(api::labs::get_lab))
        .route("/labs/:id/computers", get(api::labs::list_computers))
        .route("/labs/:id/timeslots", get(api::labs::list_timeslots))
        // Bookings
        .route("/bookings", post(api::bookings::create_booking))
        .route("/bookings/mine", get(api::bookings::list_my_bookings))
        .route("/bookings/pending", get(api::bookings::list_pending_bookings))
        .route("/bookings/bulk-approve", post(api::bookings::bulk_approve_bookings))
        .route("/bookings/bulk-cancel", post(api::bookings::bulk_cancel_bookings))
        .route("/bookings/:id", get(api::bookings::get_booking))
        .route("/bookings/:id/approve", post(api::bookings::approve_booking))
        .route("/bookings/:id/reject", post(api::bookings::reject_booking))
        .route("/bookings/:id/cancel", post(api::bookings::cancel_booking))
        .route("/bookings/:id/extend", post(api::bookings::extend_booking))
        .route(
            "/bookings/:id/attendance",
            post(api::sessions::mark_booking_attendance),
        )
        .route("/bookings/:id/rating", post(api::ratings::rate_booking))
        // Sessions
        .route("/sessions", post(api::sessions::create_session))
        .route("/sessions/upcoming", get(api::sessions::list_upcoming_sessions))
        .route("/sessions/mine", get(api::sessions::list_my_sessions))
        .route("/sessions/pending", get(api::sessions::list_pending_sessions))
        .route("/sessions/bulk-approve", post(api::sessions::bulk_approve_sessions))
        .route("/sessions/bulk-cancel", post(api::sessions::bulk_cancel_sessions))
        .route("/sessions/:id", get(api::sessions::get_session))
        .route("/sessions/:id/approve", post(api::sessions::approve_session))
        .route("/sessions/:id/reject", post(api::sessions::reject_session))
        .route("/sessions/:id/cancel", post(api::sessions::cancel_session))
        .route("/sessions/:id/join", post(api::sessions::join_session))
        .route(
            "/sessions/:id/attendance",
            get(api::sessions::list_session_attendance)
                .post(api::sessions::bulk_session_attendance),
        )
        .route(
            "/sessions/:id/attendance/:student_id",
            post(api::sessions::mark_session_attendance),
        )
        .route(
            "/sessions/:id/ratings/:student_id",
            post(api::ratings::rate_session_student),
        )
        // Student ratings
        .route("/students/:id/ratings", get(api::ratings::list_student_ratings))
        .route(
            "/students/:id/rating-summary",
            get(api::ratings::student_rating_summary),
        )
        // Recurring sessions
        .route("/recurring-sessions", post(api::recurring::create_recurring))
        .route("/recurring-sessions/mine", get(api::recurring::list_my_recurring))
        .route(
            "/recurring-sessions/pending",
            get(api::recurring::list_pending_recurring),
        )
        .route(
            "/recurring-sessions/bulk-approve",
            post(api::recurring::bulk_approve_recurring),
        )
        .route("/recurring-sessions/:id", get(api::recurring::get_recurring))
        .route(
            "/recurring-sessions/:id/approve",
            post(api::recurring::approve_recurring),
        )
        .route(
            "/recurring-sessions/:id/reject",
            post(api::recurring::reject_recurring),
        )
        .route(
            "/recurring-sessions/:id/cancel",
            post(api::recurring::cancel_recurring),
        )
        // Notifications
        .route("/notifications", get(api::notifications::list_notifications))
        .route("/notifications/unread", get(api::notifications::unread_count))
        .route("/notifications/mark-read", post(api::notifications::mark_all_read))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
