//! Metric data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single derived number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name (or bucket label for series).
    pub name: String,
    /// Value.
    pub value: Decimal,
    /// Unit, e.g. `count`, `TRY`, `%`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Metric {
    /// Creates a metric without a unit.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Decimal) -> Self {
        Self {
            name: name.into(),
            value,
            unit: None,
        }
    }

    /// Attaches a unit.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// How bucket values are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Number of matching events.
    Count,
    /// Sum of the matching events' amounts.
    Sum,
}

/// Direction of a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Recent values are clearly higher.
    Up,
    /// Recent values are clearly lower.
    Down,
    /// Change within the threshold band.
    Stable,
}

/// Trend classification of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Direction.
    pub direction: TrendDirection,
    /// Absolute percent change, 1 dp.
    pub percentage: Decimal,
}

impl TrendResult {
    /// The result for series too short to classify.
    #[must_use]
    pub const fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            percentage: Decimal::ZERO,
        }
    }
}

/// One group of a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEntry {
    /// Group name.
    pub name: String,
    /// Group count (or summed amount for weighted distributions).
    pub count: Decimal,
    /// Share of the total, 2 dp.
    pub percentage: Decimal,
}

/// What a tag's share is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagShare {
    /// Share of all tag occurrences; percentages sum to 100.
    #[default]
    OfOccurrences,
    /// Share of items carrying the tag; percentages may sum past 100.
    OfItems,
}

/// Summary statistics over a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Sum of values.
    pub total: Decimal,
    /// Mean value, 1 dp.
    pub average: Decimal,
    /// Largest value.
    pub max: Decimal,
    /// Smallest value.
    pub min: Decimal,
    /// Number of values.
    pub count: usize,
}

/// Trend, prediction and summary of a series, attached to series reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesAnalytics {
    /// Summary statistics; absent for an empty series.
    pub performance: Option<PerformanceSummary>,
    /// Trend classification.
    pub trend: TrendResult,
    /// Naive next-period prediction.
    pub prediction: Decimal,
}

/// Kind of advisory message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    /// One group dwarfs another.
    Imbalance,
    /// Groups well below the average.
    LowStock,
}

/// Non-fatal observation about a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// Kind.
    pub kind: AdvisoryKind,
    /// Groups the advisory is about.
    pub groups: Vec<String>,
    /// Ratio or threshold behind the advisory.
    pub ratio: Decimal,
}
