//! Recurring session template and occurrence expansion

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::ValidationError;

use super::status::ReservationStatus;
use super::time_window::TimeWindow;

/// Recurrence cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum Cadence {
    Daily = 0,
    Weekly = 1,
    Monthly = 2,
}

impl From<i16> for Cadence {
    fn from(v: i16) -> Self {
        match v {
            1 => Cadence::Weekly,
            2 => Cadence::Monthly,
            _ => Cadence::Daily,
        }
    }
}

impl From<Cadence> for i16 {
    fn from(c: Cadence) -> Self {
        c as i16
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Monthly => "monthly",
        };
        write!(f, "{}", label)
    }
}

impl Cadence {
    /// Enumerate every occurrence date in `[start_date, end_date]`.
    ///
    /// Monthly stepping uses `chrono::Months`, so a template anchored on the
    /// 31st lands on the last day of shorter months (chrono's clamping).
    pub fn occurrence_dates(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<NaiveDate>, ValidationError> {
        if end_date < start_date {
            return Err(ValidationError::InvalidDateRange);
        }

        let mut dates = Vec::new();
        match self {
            Cadence::Daily | Cadence::Weekly => {
                let step = match self {
                    Cadence::Daily => Duration::days(1),
                    _ => Duration::days(7),
                };
                let mut current = start_date;
                while current <= end_date {
                    dates.push(current);
                    current += step;
                }
            }
            Cadence::Monthly => {
                let mut months = 0u32;
                loop {
                    match start_date.checked_add_months(Months::new(months)) {
                        Some(date) if date <= end_date => dates.push(date),
                        _ => break,
                    }
                    months += 1;
                }
            }
        }
        Ok(dates)
    }
}

/// Recurring session template. On approval it expands into one concrete
/// approved lab session per occurrence date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RecurringSession {
    pub id: i32,
    pub lab_id: i32,
    pub lecturer_id: i32,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Time of day each occurrence starts
    pub start_time: NaiveTime,
    /// Time of day each occurrence ends
    pub end_time: NaiveTime,
    pub cadence: Cadence,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl RecurringSession {
    /// Concrete occurrence windows for this template
    pub fn occurrence_windows(&self) -> Result<Vec<TimeWindow>, ValidationError> {
        expand_occurrences(
            self.cadence,
            self.start_date,
            self.end_date,
            self.start_time,
            self.end_time,
        )
    }
}

/// Create recurring session request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecurringSession {
    pub lab_id: i32,
    pub title: String,
    /// First possible occurrence date (YYYY-MM-DD)
    pub start_date: NaiveDate,
    /// Last possible occurrence date (YYYY-MM-DD)
    pub end_date: NaiveDate,
    /// Time of day each occurrence starts (HH:MM:SS)
    pub start_time: NaiveTime,
    /// Time of day each occurrence ends (HH:MM:SS)
    pub end_time: NaiveTime,
    pub cadence: Cadence,
}

/// Expand a cadence and time-of-day window into concrete occurrence windows.
/// Times are interpreted in UTC, the server-wide convention.
pub fn expand_occurrences(
    cadence: Cadence,
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<Vec<TimeWindow>, ValidationError> {
    if end_time <= start_time {
        return Err(ValidationError::EndBeforeStart);
    }
    let dates = cadence.occurrence_dates(start_date, end_date)?;
    Ok(dates
        .into_iter()
        .map(|date| TimeWindow {
            start: date.and_time(start_time).and_utc(),
            end: date.and_time(end_time).and_utc(),
        })
        .collect())
}

/// Dates (YYYY-MM-DD) of occurrences that overlap any existing window.
/// An empty result means the whole expansion is clear.
pub fn conflicting_dates(occurrences: &[TimeWindow], existing: &[TimeWindow]) -> Vec<String> {
    occurrences
        .iter()
        .filter(|occ| existing.iter().any(|e| occ.overlaps(e)))
        .map(|occ| occ.start.date_naive().format("%Y-%m-%d").to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn daily_expansion_covers_every_day() {
        let dates = Cadence::Daily
            .occurrence_dates(date(2025, 3, 10), date(2025, 3, 14))
            .unwrap();
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], date(2025, 3, 10));
        assert_eq!(dates[4], date(2025, 3, 14));
    }

    #[test]
    fn weekly_expansion_steps_seven_days() {
        let dates = Cadence::Weekly
            .occurrence_dates(date(2025, 3, 3), date(2025, 3, 24))
            .unwrap();
        assert_eq!(
            dates,
            vec![
                date(2025, 3, 3),
                date(2025, 3, 10),
                date(2025, 3, 17),
                date(2025, 3, 24)
            ]
        );
    }

    #[test]
    fn monthly_expansion_clamps_short_months() {
        let dates = Cadence::Monthly
            .occurrence_dates(date(2025, 1, 31), date(2025, 4, 30))
            .unwrap();
        // chrono clamps Jan 31 + 1 month to Feb 28 in a non-leap year
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 31),
                date(2025, 4, 30)
            ]
        );
    }

    #[test]
    fn single_day_range_yields_one_occurrence() {
        let dates = Cadence::Weekly
            .occurrence_dates(date(2025, 3, 10), date(2025, 3, 10))
            .unwrap();
        assert_eq!(dates, vec![date(2025, 3, 10)]);
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_eq!(
            Cadence::Daily.occurrence_dates(date(2025, 3, 14), date(2025, 3, 10)),
            Err(ValidationError::InvalidDateRange)
        );
    }

    #[test]
    fn expansion_rejects_inverted_time_of_day() {
        assert_eq!(
            expand_occurrences(
                Cadence::Daily,
                date(2025, 3, 10),
                date(2025, 3, 12),
                time(11, 0),
                time(9, 0),
            ),
            Err(ValidationError::EndBeforeStart)
        );
    }

    #[test]
    fn conflict_detection_reports_only_overlapping_dates() {
        // Weekly session, 4 occurrences, 10:00-12:00
        let occurrences = expand_occurrences(
            Cadence::Weekly,
            date(2025, 3, 3),
            date(2025, 3, 24),
            time(10, 0),
            time(12, 0),
        )
        .unwrap();
        assert_eq!(occurrences.len(), 4);

        // Existing approved session overlapping occurrence 3 only
        let existing = vec![TimeWindow {
            start: date(2025, 3, 17).and_time(time(11, 0)).and_utc(),
            end: date(2025, 3, 17).and_time(time(13, 0)).and_utc(),
        }];

        let conflicts = conflicting_dates(&occurrences, &existing);
        assert_eq!(conflicts, vec!["2025-03-17".to_string()]);
    }

    #[test]
    fn touching_existing_window_is_not_a_conflict() {
        let occurrences = expand_occurrences(
            Cadence::Daily,
            date(2025, 3, 10),
            date(2025, 3, 10),
            time(10, 0),
            time(11, 0),
        )
        .unwrap();
        let existing = vec![TimeWindow {
            start: date(2025, 3, 10).and_time(time(11, 0)).and_utc(),
            end: date(2025, 3, 10).and_time(time(12, 0)).and_utc(),
        }];
        assert!(conflicting_dates(&occurrences, &existing).is_empty());
    }
}
