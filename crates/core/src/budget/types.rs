//! Budget data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Financial summary derived from transactions and a carry-over balance.
///
/// Always rebuilt from scratch; never patched in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    /// Sum of income transactions.
    pub total_income: Decimal,
    /// Sum of expense transactions.
    pub total_expense: Decimal,
    /// `total_income - total_expense`.
    pub net_balance: Decimal,
    /// `carry_over + total_income`.
    pub total_budget: Decimal,
    /// `total_budget - total_expense`.
    pub remaining_budget: Decimal,
}

/// Paid fines next to the estimate for fines still accruing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FineSummary {
    /// Sum of paid fine amounts.
    pub paid: Decimal,
    /// Estimated fines of outstanding overdue loans.
    pub unpaid_estimate: Decimal,
    /// Number of outstanding overdue loans.
    pub overdue_loans: u64,
}
