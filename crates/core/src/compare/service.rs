//! Comparator.

use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::metric_set::MetricSet;
use super::types::{ComparisonResult, ComparisonSide, SideScope, SideSpec};
use crate::events::Event;
use crate::metrics::Metric;

/// Evaluates one metric set for two sides of the same event list.
#[derive(Debug, Clone, Copy)]
pub struct Comparator {
    timezone: Tz,
}

impl Comparator {
    /// Creates a comparator that reads period boundaries in `timezone`.
    #[must_use]
    pub const fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Returns true when `event` belongs to `scope`.
    ///
    /// Both sides go through this one predicate.
    #[must_use]
    pub fn in_scope(&self, scope: &SideScope, event: &Event) -> bool {
        match scope {
            SideScope::Period { range } => range.contains(event.timestamp, self.timezone),
            SideScope::Category { value } => event.category.as_deref() == Some(value.as_str()),
        }
    }

    /// Compares `left` and `right` over `events`.
    ///
    /// The metric lists come back aligned: every name appears on both sides,
    /// left-side names first, missing values as zero.
    pub fn compare<M: MetricSet + ?Sized>(
        &self,
        events: &[Event],
        left: &SideSpec,
        right: &SideSpec,
        metric_set: &M,
    ) -> ComparisonResult {
        let evaluate = |side: &SideSpec| {
            let selected: Vec<&Event> = events
                .iter()
                .filter(|event| self.in_scope(&side.scope, event))
                .collect();
            metric_set.evaluate(&selected)
        };

        let (left_metrics, right_metrics) = align(evaluate(left), evaluate(right));

        ComparisonResult {
            left: ComparisonSide {
                label: left.label.clone(),
                metrics: left_metrics,
            },
            right: ComparisonSide {
                label: right.label.clone(),
                metrics: right_metrics,
            },
        }
    }
}

fn align(left: Vec<Metric>, right: Vec<Metric>) -> (Vec<Metric>, Vec<Metric>) {
    let mut names: Vec<(String, Option<String>)> = Vec::new();
    for metric in left.iter().chain(&right) {
        if !names.iter().any(|(name, _)| *name == metric.name) {
            names.push((metric.name.clone(), metric.unit.clone()));
        }
    }

    let pick = |metrics: &[Metric]| -> Vec<Metric> {
        names
            .iter()
            .map(|(name, unit)| {
                metrics
                    .iter()
                    .find(|metric| metric.name == *name)
                    .cloned()
                    .unwrap_or_else(|| Metric {
                        name: name.clone(),
                        value: Decimal::ZERO,
                        unit: unit.clone(),
                    })
            })
            .collect()
    };

    (pick(&left), pick(&right))
}
