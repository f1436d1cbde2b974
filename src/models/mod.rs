//! Data models for LabReserve

pub mod attendance;
pub mod booking;
pub mod lab;
pub mod notification;
pub mod rating;
pub mod recurring;
pub mod session;
pub mod status;
pub mod time_window;
pub mod timeslot;
pub mod user;

// Re-export commonly used types
pub use attendance::AttendanceStatus;
pub use booking::{BulkOutcome, ComputerBooking};
pub use lab::{Computer, ComputerStatus, Lab};
pub use notification::{Notification, NotificationKind, NotificationRefs};
pub use rating::StudentRating;
pub use recurring::{Cadence, RecurringSession};
pub use session::LabSession;
pub use status::ReservationStatus;
pub use time_window::TimeWindow;
pub use user::{User, UserClaims};
