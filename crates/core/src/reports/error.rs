//! Report error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while validating a report request.
///
/// All of them are detected before any aggregation runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Page numbers start at 1.
    #[error("Invalid page: {0} (pages start at 1)")]
    InvalidPage(u32),

    /// Page size must be positive.
    #[error("Invalid page size: {0}")]
    InvalidPageSize(u32),

    /// Report type not recognised.
    #[error("Unknown report type: {0}")]
    UnknownReportType(String),

    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Month not in `YYYY-MM` form.
    #[error("Invalid month: {0} (expected YYYY-MM)")]
    InvalidMonth(String),

    /// A parameter the report type needs was not given.
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Sort direction other than `asc`/`desc`.
    #[error("Invalid sort direction: {0}")]
    InvalidSortDirection(String),
}
