//! Raw snapshot records and the normalized event shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Label used whenever a foreign key points at nothing.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Kind of record an event was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A book loan.
    Loan,
    /// A budget income or expense entry.
    Transaction,
    /// A user sign-up.
    Registration,
    /// A book added to the catalog.
    CatalogAdd,
    /// A reward redeemed by a user.
    RewardClaim,
}

/// Direction of a budget transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl TransactionType {
    /// Parses the stored type string, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Status string carried on normalized transaction events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

/// A normalized, immutable record with a resolved timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Source record kind.
    pub kind: EventKind,
    /// Resolved instant.
    pub timestamp: DateTime<Utc>,
    /// Amount carried by the record, zero when absent.
    pub amount: Decimal,
    /// Category-like grouping key (book category, class, reward name).
    pub category: Option<String>,
    /// User who caused the event.
    pub actor_id: Option<String>,
    /// Referenced entity (book id, transaction id).
    pub ref_id: Option<String>,
    /// Record status (return status, transaction type, book status).
    pub status: Option<String>,
    /// Free-form tags, exploded by tag distributions.
    pub tags: Vec<String>,
}

impl Event {
    /// Income/expense direction for transaction events.
    #[must_use]
    pub fn transaction_type(&self) -> Option<TransactionType> {
        if self.kind != EventKind::Transaction {
            return None;
        }
        self.status.as_deref().and_then(TransactionType::parse)
    }

    /// Returns true for income transactions.
    #[must_use]
    pub fn is_income(&self) -> bool {
        self.transaction_type() == Some(TransactionType::Income)
    }

    /// Returns true for expense transactions.
    #[must_use]
    pub fn is_expense(&self) -> bool {
        self.transaction_type() == Some(TransactionType::Expense)
    }
}

/// Everything loaded for one report request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Budget ledger entries.
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
    /// Book loans.
    #[serde(default)]
    pub loans: Vec<RawLoan>,
    /// Registered users.
    #[serde(default)]
    pub users: Vec<RawUser>,
    /// Catalog books.
    #[serde(default)]
    pub books: Vec<RawBook>,
    /// Reward redemptions.
    #[serde(default)]
    pub reward_claims: Vec<RawRewardClaim>,
}

/// A loan as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLoan {
    /// Loan ID.
    #[serde(default)]
    pub id: String,
    /// Borrowed book.
    #[serde(default)]
    pub book_id: Option<String>,
    /// Borrowing user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// When the book went out.
    #[serde(default)]
    pub borrowed_at: Option<Value>,
    /// When the book is due back.
    #[serde(default)]
    pub due_date: Option<Value>,
    /// When the book came back.
    #[serde(default)]
    pub returned_at: Option<Value>,
    /// `borrowed` or `returned`.
    #[serde(default)]
    pub return_status: Option<String>,
    /// Fine charged for the loan.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub fine_amount: Option<Decimal>,
    /// `paid` or `unpaid`.
    #[serde(default)]
    pub fine_status: Option<String>,
    /// When the fine was paid.
    #[serde(default)]
    pub payment_date: Option<Value>,
    /// Owning campus.
    #[serde(default)]
    pub campus_id: Option<String>,
}

impl RawLoan {
    /// Returns true when the fine has been paid.
    #[must_use]
    pub fn fine_paid(&self) -> bool {
        self.fine_status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("paid"))
    }

    /// Returns true while the book is still out.
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        self.return_status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("borrowed"))
    }
}

/// A budget transaction as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    /// Transaction ID.
    #[serde(default)]
    pub id: String,
    /// `income` or `expense`.
    #[serde(default, rename = "type")]
    pub transaction_type: Option<String>,
    /// Amount.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: Option<Decimal>,
    /// Category.
    #[serde(default)]
    pub category: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Booking date.
    #[serde(default)]
    pub date: Option<Value>,
    /// Owning campus.
    #[serde(default)]
    pub campus_id: Option<String>,
}

/// A user as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    /// User ID.
    #[serde(default, alias = "uid")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Class or cohort.
    #[serde(default)]
    pub student_class: Option<String>,
    /// Registration time.
    #[serde(default)]
    pub created_at: Option<Value>,
    /// Owning campus.
    #[serde(default)]
    pub campus_id: Option<String>,
}

/// A catalog book as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBook {
    /// Book ID.
    #[serde(default)]
    pub id: String,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Author.
    #[serde(default)]
    pub author: Option<String>,
    /// Publisher.
    #[serde(default)]
    pub publisher: Option<String>,
    /// Category.
    #[serde(default)]
    pub category: Option<String>,
    /// `available`, `borrowed` or `lost`.
    #[serde(default)]
    pub status: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the book entered the catalog.
    #[serde(default)]
    pub added_date: Option<Value>,
    /// Owning campus.
    #[serde(default)]
    pub campus_id: Option<String>,
}

/// A reward claim as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRewardClaim {
    /// Claim ID.
    #[serde(default)]
    pub id: String,
    /// Claiming user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Reward name.
    #[serde(default)]
    pub reward_name: Option<String>,
    /// Points spent.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub points: Option<Decimal>,
    /// Claim time.
    #[serde(default)]
    pub claimed_at: Option<Value>,
    /// Claim status.
    #[serde(default)]
    pub status: Option<String>,
    /// Owning campus.
    #[serde(default)]
    pub campus_id: Option<String>,
}

/// A borrowed view of one raw record plus its kind.
#[derive(Debug, Clone, Copy)]
pub enum RawRecord<'a> {
    /// A loan.
    Loan(&'a RawLoan),
    /// A transaction.
    Transaction(&'a RawTransaction),
    /// A user registration.
    Registration(&'a RawUser),
    /// A catalog addition.
    CatalogAdd(&'a RawBook),
    /// A reward claim.
    RewardClaim(&'a RawRewardClaim),
}

/// Amounts that are not numbers are treated as absent instead of failing the snapshot.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::Number(number) => {
            let text = number.to_string();
            text.parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(text) => text.trim().parse::<Decimal>().ok(),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_accepts_camel_case_and_dirty_amounts() {
        let snapshot: Snapshot = serde_json::from_value(serde_json::json!({
            "loans": [
                { "id": "l1", "bookId": "b1", "userId": "u1", "fineAmount": 15, "fineStatus": "paid" },
                { "id": "l2", "fineAmount": "not a number" }
            ],
            "transactions": [
                { "id": "t1", "type": "income", "amount": "500.25", "category": "Bağış" }
            ],
            "users": [ { "uid": "u1", "displayName": "Ayşe" } ]
        }))
        .expect("snapshot should parse");

        assert_eq!(snapshot.loans[0].fine_amount, Some(dec!(15)));
        assert!(snapshot.loans[0].fine_paid());
        assert_eq!(snapshot.loans[1].fine_amount, None);
        assert_eq!(snapshot.transactions[0].amount, Some(dec!(500.25)));
        assert_eq!(snapshot.users[0].id, "u1");
        assert!(snapshot.books.is_empty());
    }

    #[test]
    fn test_transaction_type_parse() {
        assert_eq!(TransactionType::parse("Income"), Some(TransactionType::Income));
        assert_eq!(TransactionType::parse(" expense "), Some(TransactionType::Expense));
        assert_eq!(TransactionType::parse("transfer"), None);
    }
}
