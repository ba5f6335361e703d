//! Change detection between two runs of the same report.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reports::{Report, ReportData};

/// One numeric value that moved between two runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataChange {
    /// Row name in the newer report (the older one if the row disappeared).
    pub name: String,
    /// Value in the older report, 0 if the row is new.
    pub old_value: Decimal,
    /// Value in the newer report, 0 if the row disappeared.
    pub new_value: Decimal,
    /// `new_value - old_value`.
    pub change: Decimal,
}

/// Pairs the data rows of two reports by position and lists every value
/// that differs.
///
/// Reports of different types, or payloads without numeric rows, yield no
/// changes.
#[must_use]
pub fn detect_changes(previous: &Report, next: &Report) -> Vec<DataChange> {
    if previous.report_type != next.report_type {
        return Vec::new();
    }

    let old_rows = numeric_rows(&previous.data);
    let new_rows = numeric_rows(&next.data);
    let len = old_rows.len().max(new_rows.len());

    (0..len)
        .filter_map(|index| {
            let old = old_rows.get(index);
            let new = new_rows.get(index);
            let name = new.or(old).map(|(name, _)| name.clone())?;
            let old_value = old.map_or(Decimal::ZERO, |(_, value)| *value);
            let new_value = new.map_or(Decimal::ZERO, |(_, value)| *value);

            (old_value != new_value).then(|| DataChange {
                name,
                old_value,
                new_value,
                change: new_value - old_value,
            })
        })
        .collect()
}

fn numeric_rows(data: &ReportData) -> Vec<(String, Decimal)> {
    match data {
        ReportData::Metrics(metrics) => metrics
            .iter()
            .map(|metric| (metric.name.clone(), metric.value))
            .collect(),
        ReportData::Distribution(entries) => entries
            .iter()
            .map(|entry| (entry.name.clone(), entry.count))
            .collect(),
        ReportData::Ranking(entries) => entries
            .iter()
            .map(|entry| (entry.label.clone(), entry.value))
            .collect(),
        ReportData::Comparison(result) => {
            let side = |prefix: &str, metrics: &[crate::metrics::Metric]| {
                metrics
                    .iter()
                    .map(|metric| (format!("{prefix}:{}", metric.name), metric.value))
                    .collect::<Vec<_>>()
            };
            let mut rows = side(&result.left.label, &result.left.metrics);
            rows.extend(side(&result.right.label, &result.right.metrics));
            rows
        }
        ReportData::Budget(summary) => vec![
            ("totalIncome".to_string(), summary.total_income),
            ("totalExpense".to_string(), summary.total_expense),
            ("netBalance".to_string(), summary.net_balance),
            ("totalBudget".to_string(), summary.total_budget),
            ("remainingBudget".to_string(), summary.remaining_budget),
        ],
        ReportData::Transactions(page) => page
            .data
            .iter()
            .map(|row| (row.id.clone(), row.amount))
            .collect(),
    }
}
