//! Top-N and bottom-N ordering over grouped values.

pub mod engine;

pub use engine::{RankingEngine, RankingEntry};
