//! Raw records, normalization into events, and foreign-key joins.

pub mod directory;
pub mod normalizer;
pub mod types;

pub use directory::Directory;
pub use normalizer::{EventNormalizer, LoanClock, Normalized, usable_amount};
pub use types::{
    Event, EventKind, RawBook, RawLoan, RawRecord, RawRewardClaim, RawTransaction, RawUser,
    Snapshot, TransactionType, UNKNOWN_LABEL,
};
