//! Side-by-side metric sets for two periods or two categories.

pub mod metric_set;
pub mod service;
pub mod types;

pub use metric_set::{ExpenseBreakdown, LoanActivity, MetricSet};
pub use service::Comparator;
pub use types::{ComparisonResult, ComparisonSide, SideScope, SideSpec};
