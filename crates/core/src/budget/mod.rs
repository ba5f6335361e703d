//! Budget ledger and fine accounting.

pub mod service;
pub mod types;


pub use service::BudgetLedger;
pub use types::{BudgetSummary, FineSummary};
