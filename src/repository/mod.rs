//! Repository layer for database operations

pub mod attendance;
pub mod bookings;
pub mod labs;
pub mod notifications;
pub mod ratings;
pub mod recurring;
pub mod sessions;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub labs: labs::LabsRepository,
    pub bookings: bookings::BookingsRepository,
    pub sessions: sessions::SessionsRepository,
    pub recurring: recurring::RecurringRepository,
    pub notifications: notifications::NotificationsRepository,
    pub attendance: attendance::AttendanceRepository,
    pub ratings: ratings::RatingsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            labs: labs::LabsRepository::new(pool.clone()),
            bookings: bookings::BookingsRepository::new(pool.clone()),
            sessions: sessions::SessionsRepository::new(pool.clone()),
            recurring: recurring::RecurringRepository::new(pool.clone()),
            notifications: notifications::NotificationsRepository::new(pool.clone()),
            attendance: attendance::AttendanceRepository::new(pool.clone()),
            ratings: ratings::RatingsRepository::new(pool.clone()),
            pool,
        }
    }
}
