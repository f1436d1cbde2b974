//! Reservation lifecycle status shared by bookings, sessions and
//! recurring session templates.
//!
//! Replaces the historical `is_approved`/`is_cancelled` flag pairs with a
//! single enum so that invalid combinations cannot be represented and
//! illegal transitions are rejected up front.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;

/// Lifecycle state of a booking, session or recurring template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum ReservationStatus {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
    Cancelled = 3,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Validate a lifecycle transition.
    ///
    /// Allowed: pending -> approved, pending -> rejected,
    /// approved -> cancelled. Rejected and cancelled are terminal.
    pub fn validate_transition(self, to: ReservationStatus) -> Result<(), ValidationError> {
        use ReservationStatus::*;
        let allowed = matches!(
            (self, to),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Cancelled)
        );
        if allowed {
            Ok(())
        } else {
            Err(ValidationError::IllegalTransition {
                from: self.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }
}

impl From<i16> for ReservationStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => ReservationStatus::Approved,
            2 => ReservationStatus::Rejected,
            3 => ReservationStatus::Cancelled,
            _ => ReservationStatus::Pending,
        }
    }
}

impl From<ReservationStatus> for i16 {
    fn from(s: ReservationStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ReservationStatus::*;

    #[test]
    fn pending_can_be_decided() {
        assert!(Pending.validate_transition(Approved).is_ok());
        assert!(Pending.validate_transition(Rejected).is_ok());
    }

    #[test]
    fn approved_can_only_be_cancelled() {
        assert!(Approved.validate_transition(Cancelled).is_ok());
        assert!(Approved.validate_transition(Approved).is_err());
        assert!(Approved.validate_transition(Rejected).is_err());
        assert!(Approved.validate_transition(Pending).is_err());
    }

    #[test]
    fn terminal_states_stay_terminal() {
        for terminal in [Rejected, Cancelled] {
            for target in [Pending, Approved, Rejected, Cancelled] {
                assert!(terminal.validate_transition(target).is_err());
            }
        }
    }

    #[test]
    fn pending_cannot_be_cancelled_directly() {
        assert!(Pending.validate_transition(Cancelled).is_err());
    }
}
