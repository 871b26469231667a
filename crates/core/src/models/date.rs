//! Candidate date helpers
//!
//! Dates travel as ISO `YYYY-MM-DD` strings and display as `M/D (요일)`.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{Error, Result};

const ISO_DATE: &str = "%Y-%m-%d";

/// Korean weekday names, Sunday first
const WEEKDAYS: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];

/// Parse an ISO calendar date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ISO_DATE)
        .map_err(|e| Error::Validation(format!("Invalid date '{}': {}", s.trim(), e)))
}

/// Render a date as `M/D (요일)`
pub fn format_date(date: NaiveDate) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_sunday() as usize];
    format!("{}/{} ({})", date.month(), date.day(), weekday)
}

/// Shortcut selections offered when creating a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickPick {
    /// The coming Saturday and Sunday
    ThisWeekend,
    /// Monday through Friday of next week
    NextWeekWeekdays,
    /// Monday through Sunday of next week
    NextWeek,
}

impl QuickPick {
    pub fn dates(self, today: NaiveDate) -> Vec<NaiveDate> {
        let dates = match self {
            QuickPick::ThisWeekend => vec![next_weekday(today, 6), next_weekday(today, 0)],
            QuickPick::NextWeekWeekdays => {
                let monday = next_week_monday(today);
                days_between(monday, monday + Duration::days(4))
            }
            QuickPick::NextWeek => {
                let monday = next_week_monday(today);
                days_between(monday, monday + Duration::days(6))
            }
        };

        dates.into_iter().filter(|d| *d >= today).collect()
    }
}

/// Longest range, in days, a single selection may span
pub const MAX_RANGE_DAYS: i64 = 366;

/// Every date in the inclusive range, in either order, dropping past dates
pub fn expand_range(from: NaiveDate, to: NaiveDate, today: NaiveDate) -> Result<Vec<NaiveDate>> {
    let (start, end) = if from <= to { (from, to) } else { (to, from) };
    let span = (end - start).num_days() + 1;
    if span > MAX_RANGE_DAYS {
        return Err(Error::Validation(format!(
            "Date range {}..{} spans {} days; at most {} allowed",
            start, end, span, MAX_RANGE_DAYS
        )));
    }

    Ok(days_between(start, end)
        .into_iter()
        .filter(|d| *d >= today)
        .collect())
}

/// First day strictly after `today` falling on the weekday (0 = Sunday)
fn next_weekday(today: NaiveDate, target_from_sunday: u32) -> NaiveDate {
    let current = today.weekday().num_days_from_sunday();
    let mut ahead = (target_from_sunday + 7 - current) % 7;
    if ahead == 0 {
        ahead = 7;
    }
    today + Duration::days(ahead as i64)
}

/// Monday of the week after the one containing `today` (weeks start on Monday)
fn next_week_monday(today: NaiveDate) -> NaiveDate {
    let start_of_week = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    start_of_week + Duration::days(7)
}

fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date("2025-06-06")), "6/6 (금)");
        assert_eq!(format_date(date("2025-12-25")), "12/25 (목)");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("2025-13-01").is_err());
        assert!(parse_date("tomorrow").is_err());
        assert_eq!(parse_date(" 2025-06-06 ").unwrap(), date("2025-06-06"));
    }

    #[test]
    fn test_this_weekend_from_wednesday() {
        let picks = QuickPick::ThisWeekend.dates(date("2025-06-04"));
        assert_eq!(picks, vec![date("2025-06-07"), date("2025-06-08")]);
    }

    #[test]
    fn test_this_weekend_from_saturday_skips_today() {
        // Saturday: next Saturday is a week out, next Sunday is tomorrow
        let picks = QuickPick::ThisWeekend.dates(date("2025-06-07"));
        assert_eq!(picks, vec![date("2025-06-14"), date("2025-06-08")]);
    }

    #[test]
    fn test_next_week() {
        let today = date("2025-06-04");
        let weekdays = QuickPick::NextWeekWeekdays.dates(today);
        assert_eq!(weekdays.first(), Some(&date("2025-06-09")));
        assert_eq!(weekdays.last(), Some(&date("2025-06-13")));
        assert_eq!(weekdays.len(), 5);

        let full = QuickPick::NextWeek.dates(today);
        assert_eq!(full.len(), 7);
        assert_eq!(full.last(), Some(&date("2025-06-15")));
    }

    #[test]
    fn test_expand_range_reversed_and_past_dropped() {
        let range =
            expand_range(date("2025-06-08"), date("2025-06-03"), date("2025-06-05")).unwrap();
        assert_eq!(
            range,
            vec![
                date("2025-06-05"),
                date("2025-06-06"),
                date("2025-06-07"),
                date("2025-06-08"),
            ]
        );
    }

    #[test]
    fn test_expand_range_span_limit() {
        let today = date("2025-01-01");
        let year = expand_range(date("2025-01-01"), date("2026-01-01"), today).unwrap();
        assert_eq!(year.len(), 366);

        let err = expand_range(date("2025-01-01"), date("2026-01-02"), today).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = expand_range(date("0001-01-01"), date("9999-12-31"), today).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
