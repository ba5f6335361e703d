//! Comparison data types.

use serde::{Deserialize, Serialize};

use crate::metrics::Metric;
use crate::period::DateRange;

/// Which events a side covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideScope {
    /// Events whose local date falls within the range.
    Period {
        /// Inclusive local dates.
        range: DateRange,
    },
    /// Events whose category equals the value.
    Category {
        /// Category label.
        value: String,
    },
}

/// A labelled side of a comparison request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSpec {
    /// Display label.
    pub label: String,
    /// Covered events.
    pub scope: SideScope,
}

impl SideSpec {
    /// A side covering a date range.
    #[must_use]
    pub fn period(label: impl Into<String>, range: DateRange) -> Self {
        Self {
            label: label.into(),
            scope: SideScope::Period { range },
        }
    }

    /// A side covering one category.
    #[must_use]
    pub fn category(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            scope: SideScope::Category { value },
        }
    }
}

/// One evaluated side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSide {
    /// Display label.
    pub label: String,
    /// Metrics, aligned by name with the other side.
    pub metrics: Vec<Metric>,
}

/// Both sides of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Left side.
    pub left: ComparisonSide,
    /// Right side.
    pub right: ComparisonSide,
}
