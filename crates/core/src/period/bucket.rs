//! Month buckets for trend series.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::labels::month_name;
use super::range::{DateRange, YearMonth};

/// Number of months in an academic year, September through June.
pub const ACADEMIC_YEAR_MONTHS: u32 = 10;

/// First month of the academic year.
pub const ACADEMIC_YEAR_START_MONTH: u32 = 9;

/// One calendar month of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Stable key (`2024-03` for trailing series, the month name for academic years).
    pub key: String,
    /// Display label.
    pub label: String,
    /// First day of the month.
    pub start: NaiveDate,
    /// Last day of the month.
    pub end: NaiveDate,
    /// Calendar year.
    pub year: i32,
    /// Zero-based month.
    pub month_index: u32,
}

impl Bucket {
    fn trailing(month: YearMonth) -> Self {
        Self::with_key(month, month.to_string())
    }

    fn academic(month: YearMonth) -> Self {
        Self::with_key(month, month_name(month.month_index()).to_string())
    }

    fn with_key(month: YearMonth, key: String) -> Self {
        Self {
            key,
            label: month_name(month.month_index()).to_string(),
            start: month.first_day(),
            end: month.last_day(),
            year: month.year,
            month_index: month.month_index(),
        }
    }

    /// The month this bucket covers.
    #[must_use]
    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month_index + 1,
        }
    }

    /// The bucket as an inclusive date range.
    #[must_use]
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }
}

/// Assigns instants to month buckets in a fixed local zone.
#[derive(Debug, Clone, Copy)]
pub struct TimeBucketer {
    timezone: Tz,
}

impl TimeBucketer {
    /// Creates a bucketer for the given local zone.
    #[must_use]
    pub const fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Returns the configured zone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The `count` months ending with the reference month, oldest first.
    #[must_use]
    pub fn trailing(&self, reference: DateTime<Utc>, count: u32) -> Vec<Bucket> {
        let anchor = YearMonth::of(reference, self.timezone);
        (0..count)
            .rev()
            .map(|back| Bucket::trailing(anchor.minus_months(back)))
            .collect()
    }

    /// September through June of the academic year containing `selected`.
    ///
    /// The year starts in September of the selected year when the selected
    /// month is September or later, otherwise in September of the year before.
    #[must_use]
    pub fn academic_year(&self, selected: YearMonth) -> Vec<Bucket> {
        let start_year = if selected.month >= ACADEMIC_YEAR_START_MONTH {
            selected.year
        } else {
            selected.year - 1
        };
        let start = YearMonth {
            year: start_year,
            month: ACADEMIC_YEAR_START_MONTH,
        };

        (0..ACADEMIC_YEAR_MONTHS)
            .map(|offset| Bucket::academic(start.plus_months(i64::from(offset))))
            .collect()
    }

    /// Index of the bucket whose local month equals the instant's local month.
    #[must_use]
    pub fn locate(&self, buckets: &[Bucket], instant: DateTime<Utc>) -> Option<usize> {
        let month = YearMonth::of(instant, self.timezone);
        buckets
            .iter()
            .position(|bucket| bucket.year == month.year && bucket.month_index == month.month_index())
    }

    /// The whole span covered by a series, if it is not empty.
    #[must_use]
    pub fn span(buckets: &[Bucket]) -> Option<DateRange> {
        Some(DateRange {
            start: buckets.first()?.start,
            end: buckets.last()?.end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucketer() -> TimeBucketer {
        TimeBucketer::new(chrono_tz::Europe::Istanbul)
    }

    fn instant(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_trailing_is_chronological_and_crosses_years() {
        let buckets = bucketer().trailing(instant("2024-02-15T12:00:00Z"), 6);
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();

        assert_eq!(
            keys,
            ["2023-09", "2023-10", "2023-11", "2023-12", "2024-01", "2024-02"]
        );
        assert_eq!(buckets[0].label, "Eylül");
        assert_eq!(buckets[5].month_index, 1);
        assert_eq!(buckets[5].end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_academic_year_from_spring_month() {
        let buckets = bucketer().academic_year(YearMonth::new(2024, 3).unwrap());

        assert_eq!(buckets.len(), 10);
        assert_eq!(buckets[0].key, "Eylül");
        assert_eq!((buckets[0].year, buckets[0].month_index), (2023, 8));
        assert_eq!(buckets[9].key, "Haziran");
        assert_eq!((buckets[9].year, buckets[9].month_index), (2024, 5));
    }

    #[test]
    fn test_academic_year_from_autumn_month() {
        let buckets = bucketer().academic_year(YearMonth::new(2024, 9).unwrap());

        assert_eq!((buckets[0].year, buckets[0].month_index), (2024, 8));
        assert_eq!((buckets[4].year, buckets[4].month_index), (2025, 0));
    }

    #[test]
    fn test_locate_uses_local_month() {
        let buckets = bucketer().trailing(instant("2024-03-15T12:00:00Z"), 2);

        // Still February in UTC, already March in Istanbul.
        assert_eq!(
            bucketer().locate(&buckets, instant("2024-02-29T21:30:00Z")),
            Some(1)
        );
        assert_eq!(
            bucketer().locate(&buckets, instant("2024-02-29T20:30:00Z")),
            Some(0)
        );
        assert_eq!(bucketer().locate(&buckets, instant("2023-12-10T00:00:00Z")), None);
    }

    #[test]
    fn test_span() {
        let buckets = bucketer().trailing(instant("2024-03-15T12:00:00Z"), 3);
        let span = TimeBucketer::span(&buckets).unwrap();

        assert_eq!(span.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(span.end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert!(TimeBucketer::span(&[]).is_none());
    }
}
