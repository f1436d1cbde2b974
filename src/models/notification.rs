//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Kind tag attached to each notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum NotificationKind {
    NewBooking = 0,
    BookingApproved = 1,
    BookingRejected = 2,
    BookingCancelled = 3,
    BookingExtended = 4,
    BookingEnding = 5,
    ExtensionUnavailable = 6,
    SessionRequested = 7,
    SessionApproved = 8,
    SessionRejected = 9,
    SessionCancelled = 10,
    RecurringRequested = 11,
    RecurringApproved = 12,
    RecurringRejected = 13,
    AttendanceMarked = 14,
}

impl From<i16> for NotificationKind {
    fn from(v: i16) -> Self {
        match v {
            1 => NotificationKind::BookingApproved,
            2 => NotificationKind::BookingRejected,
            3 => NotificationKind::BookingCancelled,
            4 => NotificationKind::BookingExtended,
            5 => NotificationKind::BookingEnding,
            6 => NotificationKind::ExtensionUnavailable,
            7 => NotificationKind::SessionRequested,
            8 => NotificationKind::SessionApproved,
            9 => NotificationKind::SessionRejected,
            10 => NotificationKind::SessionCancelled,
            11 => NotificationKind::RecurringRequested,
            12 => NotificationKind::RecurringApproved,
            13 => NotificationKind::RecurringRejected,
            14 => NotificationKind::AttendanceMarked,
            _ => NotificationKind::NewBooking,
        }
    }
}

impl From<NotificationKind> for i16 {
    fn from(k: NotificationKind) -> Self {
        k as i16
    }
}

/// Notification row. Created by lifecycle transitions; only `is_read`
/// mutates afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub booking_id: Option<i32>,
    pub session_id: Option<i32>,
    pub recurring_session_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Optional back-references from a notification to the entity that caused it
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationRefs {
    pub booking_id: Option<i32>,
    pub session_id: Option<i32>,
    pub recurring_session_id: Option<i32>,
}

impl NotificationRefs {
    pub fn booking(id: i32) -> Self {
        Self {
            booking_id: Some(id),
            ..Default::default()
        }
    }

    pub fn session(id: i32) -> Self {
        Self {
            session_id: Some(id),
            ..Default::default()
        }
    }

    pub fn recurring(id: i32) -> Self {
        Self {
            recurring_session_id: Some(id),
            ..Default::default()
        }
    }
}
