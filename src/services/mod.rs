//! Business logic services

pub mod bookings;
pub mod dispatch;
pub mod email;
pub mod ratings;
pub mod recurring;
pub mod sessions;

use crate::{config::EmailConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub bookings: bookings::BookingsService,
    pub sessions: sessions::SessionsService,
    pub recurring: recurring::RecurringService,
    pub ratings: ratings::RatingsService,
    pub notifications: dispatch::NotificationService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, email_config: EmailConfig) -> Self {
        let email = email::EmailService::new(email_config);
        let notifications = dispatch::NotificationService::new(repository.clone());
        Self {
            bookings: bookings::BookingsService::new(
                repository.clone(),
                notifications.clone(),
                email.clone(),
            ),
            sessions: sessions::SessionsService::new(
                repository.clone(),
                notifications.clone(),
                email.clone(),
            ),
            recurring: recurring::RecurringService::new(repository.clone(), notifications.clone()),
            ratings: ratings::RatingsService::new(repository),
            notifications,
            email,
        }
    }
}
