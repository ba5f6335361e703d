//! Calendar months and inclusive date ranges in local time.

use std::fmt;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    /// Calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
}

impl YearMonth {
    /// Creates a month, rejecting months outside 1-12.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Parses `YYYY-MM`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (year, month) = text.trim().split_once('-')?;
        if month.len() != 2 {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    /// The local month an instant falls in.
    #[must_use]
    pub fn of(instant: DateTime<Utc>, timezone: Tz) -> Self {
        let local = instant.with_timezone(&timezone);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    /// Zero-based month index.
    #[must_use]
    pub const fn month_index(self) -> u32 {
        self.month - 1
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// The month `count` months earlier.
    #[must_use]
    pub fn minus_months(self, count: u32) -> Self {
        self.plus_months(-i64::from(count))
    }

    /// The month `count` months later (negative goes back).
    #[must_use]
    pub fn plus_months(self, count: i64) -> Self {
        let total = i64::from(self.year) * 12 + i64::from(self.month_index()) + count;
        Self {
            year: i32::try_from(total.div_euclid(12)).unwrap_or(self.year),
            month: u32::try_from(total.rem_euclid(12)).unwrap_or(0) + 1,
        }
    }

    /// The whole month as an inclusive date range.
    #[must_use]
    pub fn range(self) -> DateRange {
        DateRange {
            start: self.first_day(),
            end: self.last_day(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive range of local calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day, inclusive.
    pub start: NaiveDate,
    /// Last day, inclusive.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Returns true if the date lies within the range.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns true if the instant's local date lies within the range.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>, timezone: Tz) -> bool {
        self.contains_date(instant.with_timezone(&timezone).date_naive())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_month_parse() {
        assert_eq!(YearMonth::parse("2024-03"), YearMonth::new(2024, 3));
        assert_eq!(YearMonth::parse("2024-13"), None);
        assert_eq!(YearMonth::parse("2024-3"), None);
        assert_eq!(YearMonth::parse("march"), None);
    }

    #[test]
    fn test_month_arithmetic_crosses_years() {
        let march = YearMonth::new(2024, 3).unwrap();

        assert_eq!(march.minus_months(5), YearMonth::new(2023, 10).unwrap());
        assert_eq!(march.plus_months(10), YearMonth::new(2025, 1).unwrap());
        assert_eq!(march.minus_months(0), march);
    }

    #[test]
    fn test_month_bounds() {
        let feb = YearMonth::new(2024, 2).unwrap();

        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(feb.to_string(), "2024-02");
    }

    #[test]
    fn test_range_is_inclusive_on_both_ends() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();

        assert!(range.contains_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(range.contains_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(!range.contains_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
    }

    #[test]
    fn test_range_uses_local_date() {
        let range = YearMonth::new(2024, 3).unwrap().range();
        // 22:30 UTC on Feb 29 is already March 1 in Istanbul.
        let instant = DateTime::parse_from_rfc3339("2024-02-29T22:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert!(range.contains(instant, chrono_tz::Europe::Istanbul));
        assert!(!range.contains(instant, chrono_tz::UTC));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let a = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(DateRange::new(a, b).is_none());
    }
}
