//! Metric set definitions evaluated per comparison side.

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::events::{Event, EventKind, UNKNOWN_LABEL};
use crate::metrics::Metric;
use crate::ranking::RankingEngine;

/// A set of metrics computed over the events of one side.
pub trait MetricSet {
    /// Evaluates the set over `events`.
    ///
    /// Names may depend on the data; the comparator aligns both sides.
    fn evaluate(&self, events: &[&Event]) -> Vec<Metric>;
}

/// Expense total per transaction category.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpenseBreakdown;

impl MetricSet for ExpenseBreakdown {
    fn evaluate(&self, events: &[&Event]) -> Vec<Metric> {
        RankingEngine::accumulate(events.iter().filter(|event| event.is_expense()).map(|event| {
            (
                event
                    .category
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
                event.amount,
            )
        }))
        .into_iter()
        .map(|(category, total)| Metric::new(category, total).with_unit("TRY"))
        .collect()
    }
}

/// Loan volume, reach and fines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoanActivity;

impl MetricSet for LoanActivity {
    fn evaluate(&self, events: &[&Event]) -> Vec<Metric> {
        let loans: Vec<&Event> = events
            .iter()
            .copied()
            .filter(|event| event.kind == EventKind::Loan)
            .collect();

        let readers: HashSet<&str> = loans.iter().filter_map(|e| e.actor_id.as_deref()).collect();
        let books: HashSet<&str> = loans.iter().filter_map(|e| e.ref_id.as_deref()).collect();
        let returned = loans
            .iter()
            .filter(|e| {
                e.status
                    .as_deref()
                    .is_some_and(|status| status.eq_ignore_ascii_case("returned"))
            })
            .count();
        let fines = loans
            .iter()
            .fold(Decimal::ZERO, |total, e| total.saturating_add(e.amount));

        vec![
            Metric::new("loans", Decimal::from(loans.len())).with_unit("count"),
            Metric::new("readers", Decimal::from(readers.len())).with_unit("count"),
            Metric::new("books", Decimal::from(books.len())).with_unit("count"),
            Metric::new("returned", Decimal::from(returned)).with_unit("count"),
            Metric::new("fines", fines).with_unit("TRY"),
        ]
    }
}
