//! Counts, sums, shares, trends and advisories over events and series.

pub mod service;
pub mod types;


pub use service::{MetricComputer, shares};
pub use types::{
    Advisory, AdvisoryKind, Aggregation, DistributionEntry, Metric, PerformanceSummary,
    SeriesAnalytics, TagShare, TrendDirection, TrendResult,
};
