//! Hourly availability grid over the lab opening hours

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::time_window::TimeWindow;

/// Labs open at 08:00 and close at 20:00
pub const OPENING_HOUR: u32 = 8;
pub const CLOSING_HOUR: u32 = 20;

/// The grid covers the next seven days
pub const LOOKAHEAD_DAYS: i64 = 7;

/// One hourly slot of the grid
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Timeslot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub free: bool,
}

/// Hourly slots between the opening hours for `days` days starting at
/// `from`. A slot is free unless a busy window strictly overlaps it, so a
/// reservation ending exactly on the hour leaves the next slot free.
pub fn availability(from: NaiveDate, days: i64, busy: &[TimeWindow]) -> Vec<Timeslot> {
    let mut slots = Vec::new();
    for day in 0..days {
        let date = from + Duration::days(day);
        for hour in OPENING_HOUR..CLOSING_HOUR {
            let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) else {
                continue;
            };
            let start = date.and_time(time).and_utc();
            let end = start + Duration::hours(1);
            let slot = TimeWindow { start, end };
            let free = !busy.iter().any(|b| b.overlaps(&slot));
            slots.push(Timeslot { start, end, free });
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn busy(h1: u32, h2: u32) -> TimeWindow {
        TimeWindow {
            start: Utc.with_ymd_and_hms(2025, 3, 10, h1, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 10, h2, 0, 0).unwrap(),
        }
    }

    #[test]
    fn grid_covers_the_opening_hours() {
        let slots = availability(day(), 7, &[]);
        assert_eq!(slots.len(), 7 * 12);
        assert!(slots.iter().all(|s| s.free));
        assert_eq!(slots[0].start, Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap());
        assert_eq!(slots[11].end, Utc.with_ymd_and_hms(2025, 3, 10, 20, 0, 0).unwrap());
    }

    #[test]
    fn busy_windows_mark_their_slots() {
        let slots = availability(day(), 1, &[busy(10, 12)]);
        let taken: Vec<u32> = slots.iter().filter(|s| !s.free).map(|s| s.start.hour()).collect();
        assert_eq!(taken, vec![10, 11]);
    }

    #[test]
    fn reservation_ending_on_the_hour_frees_the_next_slot() {
        // Half past the hour blocks two slots, on the hour blocks one
        let half_past = TimeWindow {
            start: Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap(),
        };
        let at = |slots: &[Timeslot], hour: u32| {
            slots.iter().find(|s| s.start.hour() == hour).unwrap().free
        };

        let slots = availability(day(), 1, &[half_past]);
        assert!(!at(&slots, 14));
        assert!(!at(&slots, 15));
        assert!(at(&slots, 16));

        let slots = availability(day(), 1, &[busy(14, 15)]);
        assert!(!at(&slots, 14));
        assert!(at(&slots, 15));
    }
}
