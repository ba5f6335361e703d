//! Conversion of raw records into [`Event`]s.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde_json::Value;

use super::types::{
    Event, EventKind, RawBook, RawLoan, RawRecord, RawRewardClaim, RawTransaction, RawUser,
    Snapshot,
};

/// Largest absolute amount a single record may carry.
const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Absent amounts are zero; amounts beyond `MAX_AMOUNT` make the record unusable.
#[must_use]
pub fn usable_amount(raw: Option<Decimal>) -> Option<Decimal> {
    let amount = raw.unwrap_or(Decimal::ZERO);
    (amount.abs() <= Decimal::from(MAX_AMOUNT)).then_some(amount)
}

/// Which timestamp of a loan an event is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanClock {
    /// When the book went out.
    #[default]
    Borrowed,
    /// When the book came back. Outstanding loans have no such event.
    Returned,
    /// When the fine was paid. Only loans with a paid fine produce an event.
    FinePaid,
}

impl LoanClock {
    /// Returns true when a loan is expected to carry this clock's timestamp.
    #[must_use]
    pub fn applies_to(self, loan: &RawLoan) -> bool {
        match self {
            Self::Borrowed => true,
            Self::Returned => !loan.is_outstanding(),
            Self::FinePaid => loan.fine_paid(),
        }
    }
}

/// Events produced from a batch of records, plus how many were excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Events with a usable timestamp.
    pub events: Vec<Event>,
    /// Records excluded for a missing or unparsable timestamp, or an
    /// out-of-range amount.
    pub dropped: usize,
}

/// Converts raw records into events.
///
/// Bare dates and zone-less date-times are read as local time in the
/// configured zone; everything else already names an instant.
#[derive(Debug, Clone, Copy)]
pub struct EventNormalizer {
    timezone: Tz,
}

impl EventNormalizer {
    /// Creates a normalizer for the given local zone.
    #[must_use]
    pub const fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Returns the configured zone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Normalizes one record. `None` means the record has no usable
    /// timestamp or amount.
    #[must_use]
    pub fn normalize(&self, record: RawRecord<'_>) -> Option<Event> {
        match record {
            RawRecord::Loan(loan) => self.loan(loan, LoanClock::Borrowed),
            RawRecord::Transaction(tx) => self.transaction(tx),
            RawRecord::Registration(user) => self.registration(user),
            RawRecord::CatalogAdd(book) => self.catalog_add(book),
            RawRecord::RewardClaim(claim) => self.reward_claim(claim),
        }
    }

    /// Normalizes a batch, counting the records that had to be excluded.
    pub fn normalize_all<'a, I>(&self, records: I) -> Normalized
    where
        I: IntoIterator<Item = RawRecord<'a>>,
    {
        let mut normalized = Normalized::default();
        for record in records {
            match self.normalize(record) {
                Some(event) => normalized.events.push(event),
                None => normalized.dropped += 1,
            }
        }
        normalized
    }

    /// Normalizes a loan anchored on the chosen clock.
    #[must_use]
    pub fn loan(&self, loan: &RawLoan, clock: LoanClock) -> Option<Event> {
        let raw = match clock {
            LoanClock::Borrowed => loan.borrowed_at.as_ref(),
            LoanClock::Returned => loan.returned_at.as_ref(),
            LoanClock::FinePaid if loan.fine_paid() => loan.payment_date.as_ref(),
            LoanClock::FinePaid => None,
        }?;

        Some(Event {
            kind: EventKind::Loan,
            timestamp: self.parse_timestamp(raw)?,
            amount: usable_amount(loan.fine_amount)?,
            category: None,
            actor_id: loan.user_id.clone(),
            ref_id: loan.book_id.clone(),
            status: loan.return_status.clone(),
            tags: Vec::new(),
        })
    }

    /// Normalizes a budget transaction. The status carries `income`/`expense`.
    #[must_use]
    pub fn transaction(&self, tx: &RawTransaction) -> Option<Event> {
        let timestamp = self.parse_timestamp(tx.date.as_ref()?)?;
        Some(Event {
            kind: EventKind::Transaction,
            timestamp,
            amount: usable_amount(tx.amount)?,
            category: tx.category.clone(),
            actor_id: None,
            ref_id: Some(tx.id.clone()),
            status: tx
                .transaction_type
                .as_ref()
                .map(|kind| kind.trim().to_lowercase()),
            tags: Vec::new(),
        })
    }

    /// Normalizes a user registration. The category carries the class.
    #[must_use]
    pub fn registration(&self, user: &RawUser) -> Option<Event> {
        let timestamp = self.parse_timestamp(user.created_at.as_ref()?)?;
        Some(Event {
            kind: EventKind::Registration,
            timestamp,
            amount: Decimal::ZERO,
            category: user.student_class.clone(),
            actor_id: Some(user.id.clone()),
            ref_id: None,
            status: None,
            tags: Vec::new(),
        })
    }

    /// Normalizes a catalog addition, carrying category, status and tags.
    #[must_use]
    pub fn catalog_add(&self, book: &RawBook) -> Option<Event> {
        let timestamp = self.parse_timestamp(book.added_date.as_ref()?)?;
        Some(Event {
            kind: EventKind::CatalogAdd,
            timestamp,
            amount: Decimal::ZERO,
            category: book.category.clone(),
            actor_id: None,
            ref_id: Some(book.id.clone()),
            status: book.status.clone(),
            tags: book.tags.clone(),
        })
    }

    /// Normalizes a reward claim. The category carries the reward name.
    #[must_use]
    pub fn reward_claim(&self, claim: &RawRewardClaim) -> Option<Event> {
        let timestamp = self.parse_timestamp(claim.claimed_at.as_ref()?)?;
        Some(Event {
            kind: EventKind::RewardClaim,
            timestamp,
            amount: usable_amount(claim.points)?,
            category: claim.reward_name.clone(),
            actor_id: claim.user_id.clone(),
            ref_id: Some(claim.id.clone()),
            status: claim.status.clone(),
            tags: Vec::new(),
        })
    }

    /// All loans of a snapshot on one clock.
    ///
    /// Loans the clock does not apply to (still out, fine not paid) are
    /// skipped rather than counted as dropped.
    #[must_use]
    pub fn loans(&self, snapshot: &Snapshot, clock: LoanClock) -> Normalized {
        let mut normalized = Normalized::default();
        for loan in snapshot.loans.iter().filter(|loan| clock.applies_to(loan)) {
            match self.loan(loan, clock) {
                Some(event) => normalized.events.push(event),
                None => normalized.dropped += 1,
            }
        }
        normalized
    }

    /// All transactions of a snapshot.
    #[must_use]
    pub fn transactions(&self, snapshot: &Snapshot) -> Normalized {
        self.normalize_all(snapshot.transactions.iter().map(RawRecord::Transaction))
    }

    /// All user registrations of a snapshot.
    #[must_use]
    pub fn registrations(&self, snapshot: &Snapshot) -> Normalized {
        self.normalize_all(snapshot.users.iter().map(RawRecord::Registration))
    }

    /// All catalog additions of a snapshot.
    #[must_use]
    pub fn catalog_adds(&self, snapshot: &Snapshot) -> Normalized {
        self.normalize_all(snapshot.books.iter().map(RawRecord::CatalogAdd))
    }

    /// All reward claims of a snapshot.
    #[must_use]
    pub fn reward_claims(&self, snapshot: &Snapshot) -> Normalized {
        self.normalize_all(snapshot.reward_claims.iter().map(RawRecord::RewardClaim))
    }

    /// Resolves a raw timestamp value to an instant.
    ///
    /// Accepts RFC 3339 strings, local `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`
    /// strings, `{seconds, nanoseconds}` objects and epoch milliseconds.
    #[must_use]
    pub fn parse_timestamp(&self, raw: &Value) -> Option<DateTime<Utc>> {
        match raw {
            Value::String(text) => self.parse_text(text.trim()),
            Value::Number(number) => DateTime::from_timestamp_millis(number.as_i64()?),
            Value::Object(fields) => {
                let seconds = fields
                    .get("seconds")
                    .or_else(|| fields.get("_seconds"))?
                    .as_i64()?;
                let nanos = fields
                    .get("nanoseconds")
                    .or_else(|| fields.get("_nanoseconds"))
                    .and_then(Value::as_u64)
                    .and_then(|nanos| u32::try_from(nanos).ok())
                    .unwrap_or(0);
                Utc.timestamp_opt(seconds, nanos).single()
            }
            _ => None,
        }
    }

    fn parse_text(&self, text: &str) -> Option<DateTime<Utc>> {
        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Some(instant.with_timezone(&Utc));
        }

        let local = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })?;

        self.timezone
            .from_local_datetime(&local)
            .earliest()
            .map(|instant| instant.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn normalizer() -> EventNormalizer {
        EventNormalizer::new(chrono_tz::Europe::Istanbul)
    }

    fn utc(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_parse_timestamp_encodings() {
        let n = normalizer();

        assert_eq!(
            n.parse_timestamp(&json!("2024-03-05T10:00:00Z")),
            Some(utc("2024-03-05T10:00:00Z"))
        );
        assert_eq!(
            n.parse_timestamp(&json!({ "seconds": 1_709_632_800, "nanoseconds": 0 })),
            Some(utc("2024-03-05T10:00:00Z"))
        );
        assert_eq!(
            n.parse_timestamp(&json!(1_709_632_800_000_i64)),
            Some(utc("2024-03-05T10:00:00Z"))
        );
        // Istanbul is UTC+3 all year.
        assert_eq!(
            n.parse_timestamp(&json!("2024-03-05")),
            Some(utc("2024-03-04T21:00:00Z"))
        );
        assert_eq!(
            n.parse_timestamp(&json!("2024-03-05T13:00:00")),
            Some(utc("2024-03-05T10:00:00Z"))
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let n = normalizer();

        assert_eq!(n.parse_timestamp(&json!("yesterday")), None);
        assert_eq!(n.parse_timestamp(&json!(true)), None);
        assert_eq!(n.parse_timestamp(&json!({ "nanoseconds": 5 })), None);
        assert_eq!(n.parse_timestamp(&json!(null)), None);
    }

    #[test]
    fn test_loan_without_fine_defaults_amount_to_zero() {
        let loan = RawLoan {
            id: "l1".into(),
            book_id: Some("b1".into()),
            user_id: Some("u1".into()),
            borrowed_at: Some(json!("2024-03-05T10:00:00Z")),
            return_status: Some("borrowed".into()),
            ..RawLoan::default()
        };

        let event = normalizer().normalize(RawRecord::Loan(&loan)).unwrap();

        assert_eq!(event.kind, EventKind::Loan);
        assert_eq!(event.amount, Decimal::ZERO);
        assert_eq!(event.actor_id.as_deref(), Some("u1"));
        assert_eq!(event.ref_id.as_deref(), Some("b1"));
    }

    #[test]
    fn test_fine_clock_only_for_paid_fines() {
        let mut loan = RawLoan {
            borrowed_at: Some(json!("2024-03-05T10:00:00Z")),
            payment_date: Some(json!("2024-04-01T10:00:00Z")),
            fine_amount: Some(dec!(20)),
            fine_status: Some("unpaid".into()),
            ..RawLoan::default()
        };
        assert!(normalizer().loan(&loan, LoanClock::FinePaid).is_none());

        loan.fine_status = Some("paid".into());
        let event = normalizer().loan(&loan, LoanClock::FinePaid).unwrap();
        assert_eq!(event.timestamp, utc("2024-04-01T10:00:00Z"));
        assert_eq!(event.amount, dec!(20));
    }

    #[test]
    fn test_loans_skip_records_outside_the_clock() {
        let snapshot = Snapshot {
            loans: vec![
                RawLoan {
                    borrowed_at: Some(json!("2024-03-05T10:00:00Z")),
                    return_status: Some("borrowed".into()),
                    ..RawLoan::default()
                },
                RawLoan {
                    borrowed_at: Some(json!("2024-03-01")),
                    returned_at: Some(json!("not a date")),
                    return_status: Some("returned".into()),
                    ..RawLoan::default()
                },
            ],
            ..Snapshot::default()
        };

        let borrowed = normalizer().loans(&snapshot, LoanClock::Borrowed);
        assert_eq!((borrowed.events.len(), borrowed.dropped), (2, 0));

        let returned = normalizer().loans(&snapshot, LoanClock::Returned);
        assert_eq!((returned.events.len(), returned.dropped), (0, 1));

        let paid = normalizer().loans(&snapshot, LoanClock::FinePaid);
        assert_eq!(paid, Normalized::default());
    }

    #[test]
    fn test_normalize_all_counts_dropped_records() {
        let users = vec![
            RawUser {
                id: "u1".into(),
                created_at: Some(json!("2024-01-10")),
                ..RawUser::default()
            },
            RawUser {
                id: "u2".into(),
                created_at: None,
                ..RawUser::default()
            },
            RawUser {
                id: "u3".into(),
                created_at: Some(json!("31/12/2023")),
                ..RawUser::default()
            },
        ];

        let normalized = normalizer().normalize_all(users.iter().map(RawRecord::Registration));

        assert_eq!(normalized.events.len(), 1);
        assert_eq!(normalized.dropped, 2);
    }

    #[test]
    fn test_transaction_status_is_lowercased_type() {
        let tx = RawTransaction {
            id: "t1".into(),
            transaction_type: Some("Expense".into()),
            amount: Some(dec!(40)),
            date: Some(json!("2024-02-01")),
            ..RawTransaction::default()
        };

        let event = normalizer().transaction(&tx).unwrap();

        assert!(event.is_expense());
        assert!(!event.is_income());
        assert_eq!(event.amount, dec!(40));
    }

    #[test]
    fn test_out_of_range_amounts_are_dropped() {
        let transactions = [
            RawTransaction {
                id: "t1".into(),
                transaction_type: Some("income".into()),
                amount: Some(Decimal::MAX),
                date: Some(json!("2024-02-01")),
                ..RawTransaction::default()
            },
            RawTransaction {
                id: "t2".into(),
                transaction_type: Some("income".into()),
                amount: Some(dec!(1000000000000000)),
                date: Some(json!("2024-02-01")),
                ..RawTransaction::default()
            },
        ];

        let normalized =
            normalizer().normalize_all(transactions.iter().map(RawRecord::Transaction));

        assert_eq!(normalized.events.len(), 1);
        assert_eq!(normalized.events[0].ref_id.as_deref(), Some("t2"));
        assert_eq!(normalized.dropped, 1);
        assert_eq!(usable_amount(Some(Decimal::MIN)), None);
        assert_eq!(usable_amount(None), Some(Decimal::ZERO));
    }
}
