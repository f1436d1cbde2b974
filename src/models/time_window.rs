//! Half-open time interval used by bookings and sessions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;

/// A half-open interval `[start, end)`. Never persisted on its own;
/// bookings and sessions embed its two timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, enforcing `end > start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::EndBeforeStart);
        }
        Ok(Self { start, end })
    }

    /// Strict half-open intersection. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// The same window with `end` pushed back by `minutes`
    pub fn extended_by_minutes(&self, minutes: i64) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end + Duration::minutes(minutes),
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, min, 0).unwrap()
    }

    fn window(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeWindow {
        TimeWindow::new(at(h1, m1), at(h2, m2)).unwrap()
    }

    #[test]
    fn rejects_end_before_start() {
        assert_eq!(
            TimeWindow::new(at(11, 0), at(10, 0)),
            Err(ValidationError::EndBeforeStart)
        );
        assert_eq!(
            TimeWindow::new(at(10, 0), at(10, 0)),
            Err(ValidationError::EndBeforeStart)
        );
    }

    #[test]
    fn overlapping_windows_conflict() {
        let a = window(10, 0, 11, 0);
        assert!(a.overlaps(&window(10, 30, 11, 30)));
        assert!(a.overlaps(&window(9, 30, 10, 30)));
        assert!(a.overlaps(&window(10, 15, 10, 45)));
        assert!(a.overlaps(&window(9, 0, 12, 0)));
        // Overlap is symmetric
        assert!(window(10, 30, 11, 30).overlaps(&a));
    }

    #[test]
    fn touching_endpoints_do_not_conflict() {
        let a = window(10, 0, 11, 0);
        assert!(!a.overlaps(&window(11, 0, 12, 0)));
        assert!(!a.overlaps(&window(9, 0, 10, 0)));
        assert!(!a.overlaps(&window(12, 0, 13, 0)));
    }

    #[test]
    fn extension_math_matches_neighbor_windows() {
        // Booking ends at 11:00; extending by 30 minutes reaches 11:30
        let booking = window(10, 0, 11, 0);
        let extended = booking.extended_by_minutes(30);
        assert_eq!(extended.end, at(11, 30));

        // A neighbor starting at 11:20 now conflicts
        assert!(extended.overlaps(&window(11, 20, 12, 20)));
        // A neighbor starting at 11:35 does not
        assert!(!extended.overlaps(&window(11, 35, 12, 35)));
        // Neither conflicted before the extension
        assert!(!booking.overlaps(&window(11, 20, 12, 20)));
    }
}
