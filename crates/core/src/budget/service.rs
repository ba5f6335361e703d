//! Budget ledger computations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shelfwise_shared::AnalyticsConfig;

use super::types::{BudgetSummary, FineSummary};
use crate::events::{Event, EventNormalizer, RawLoan, usable_amount};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Budget ledger over transaction events and loan fines.
#[derive(Debug, Clone, Copy)]
pub struct BudgetLedger {
    normalizer: EventNormalizer,
    fine_per_day: Decimal,
}

impl BudgetLedger {
    /// Creates a ledger from the analytics configuration.
    #[must_use]
    pub const fn new(config: &AnalyticsConfig) -> Self {
        Self {
            normalizer: EventNormalizer::new(config.timezone),
            fine_per_day: config.fine_per_day,
        }
    }

    /// Computes the budget summary.
    ///
    /// Transactions may come in any order. Events that are neither income
    /// nor expense are ignored, and so is an event whose amount would
    /// overflow its running total.
    #[must_use]
    pub fn compute_summary(transactions: &[Event], carry_over: Decimal) -> BudgetSummary {
        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        for event in transactions {
            let total = if event.is_income() {
                &mut total_income
            } else if event.is_expense() {
                &mut total_expense
            } else {
                continue;
            };
            if let Some(sum) = total.checked_add(event.amount) {
                *total = sum;
            }
        }

        let total_budget = carry_over.saturating_add(total_income);
        BudgetSummary {
            total_income,
            total_expense,
            net_balance: total_income.saturating_sub(total_expense),
            total_budget,
            remaining_budget: total_budget.saturating_sub(total_expense),
        }
    }

    /// Carry-over balance: the sum of paid fines.
    ///
    /// Out-of-range fine amounts are skipped.
    #[must_use]
    pub fn carry_over_from_fines(loans: &[RawLoan]) -> Decimal {
        loans
            .iter()
            .filter(|loan| loan.fine_paid())
            .filter_map(|loan| usable_amount(loan.fine_amount))
            .fold(Decimal::ZERO, |total, fine| {
                total.checked_add(fine).unwrap_or(total)
            })
    }

    /// Fine accrued by an outstanding loan at `reference`.
    ///
    /// Returns `None` for returned loans, loans without a usable due date,
    /// and loans not yet overdue. Partial days count as whole days.
    #[must_use]
    pub fn overdue_fine(&self, loan: &RawLoan, reference: DateTime<Utc>) -> Option<Decimal> {
        if !loan.is_outstanding() || loan.fine_paid() {
            return None;
        }

        let due = self.normalizer.parse_timestamp(loan.due_date.as_ref()?)?;
        let late_millis = (reference - due).num_milliseconds();
        if late_millis <= 0 {
            return None;
        }

        let days = late_millis.div_euclid(MILLIS_PER_DAY)
            + i64::from(late_millis.rem_euclid(MILLIS_PER_DAY) > 0);
        Decimal::from(days).checked_mul(self.fine_per_day)
    }

    /// Paid fines and the unpaid estimate at `reference`.
    #[must_use]
    pub fn fine_summary(&self, loans: &[RawLoan], reference: DateTime<Utc>) -> FineSummary {
        let mut summary = FineSummary {
            paid: Self::carry_over_from_fines(loans),
            ..FineSummary::default()
        };

        for fine in loans
            .iter()
            .filter_map(|loan| self.overdue_fine(loan, reference))
        {
            summary.unpaid_estimate = summary.unpaid_estimate.saturating_add(fine);
            summary.overdue_loans += 1;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn ledger() -> BudgetLedger {
        BudgetLedger::new(&AnalyticsConfig::default())
    }

    fn reference() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn borrowed(due: &str) -> RawLoan {
        RawLoan {
            id: "l".into(),
            due_date: Some(json!(due)),
            return_status: Some("borrowed".into()),
            ..RawLoan::default()
        }
    }

    #[test]
    fn test_overdue_fine_rounds_partial_days_up() {
        // 2 days and 1 hour late
        let fine = ledger().overdue_fine(&borrowed("2024-06-13T11:00:00Z"), reference());
        assert_eq!(fine, Some(dec!(15)));
    }

    #[test]
    fn test_overdue_fine_whole_days() {
        let fine = ledger().overdue_fine(&borrowed("2024-06-13T12:00:00Z"), reference());
        assert_eq!(fine, Some(dec!(10)));
    }

    #[test]
    fn test_not_overdue_yields_none() {
        assert_eq!(
            ledger().overdue_fine(&borrowed("2024-06-20T00:00:00Z"), reference()),
            None
        );
        assert_eq!(
            ledger().overdue_fine(&borrowed("2024-06-15T12:00:00Z"), reference()),
            None
        );
    }

    #[test]
    fn test_returned_or_undated_loans_accrue_nothing() {
        let mut returned = borrowed("2024-06-01T00:00:00Z");
        returned.return_status = Some("returned".into());
        let mut undated = borrowed("2024-06-01T00:00:00Z");
        undated.due_date = Some(json!("someday"));

        assert_eq!(ledger().overdue_fine(&returned, reference()), None);
        assert_eq!(ledger().overdue_fine(&undated, reference()), None);
    }

    #[test]
    fn test_fine_summary() {
        let paid = RawLoan {
            id: "p".into(),
            fine_amount: Some(dec!(20)),
            fine_status: Some("paid".into()),
            return_status: Some("returned".into()),
            ..RawLoan::default()
        };
        let unpaid_recorded = RawLoan {
            fine_amount: Some(dec!(35)),
            fine_status: Some("unpaid".into()),
            ..RawLoan::default()
        };
        let loans = vec![
            paid,
            unpaid_recorded,
            borrowed("2024-06-13T12:00:00Z"),
            borrowed("2024-06-14T18:00:00Z"),
            borrowed("2024-07-01T00:00:00Z"),
        ];

        let summary = ledger().fine_summary(&loans, reference());

        assert_eq!(summary.paid, dec!(20));
        assert_eq!(summary.unpaid_estimate, dec!(15));
        assert_eq!(summary.overdue_loans, 2);
    }
}
