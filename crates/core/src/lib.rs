//! Core analytics for Shelfwise.
//!
//! This crate contains pure aggregation logic with ZERO web or IO dependencies.
//! Every function takes an in-memory snapshot (or values derived from one)
//! and returns new values.
//!
//! # Modules
//!
//! - `events` - Raw records, normalization into events, foreign-key joins
//! - `period` - Calendar months, academic years, bucketing
//! - `metrics` - Counts, sums, shares, trends, predictions, advisories
//! - `budget` - Budget ledger and fine accounting
//! - `ranking` - Top-N / bottom-N ordering
//! - `compare` - Period-over-period and category-over-category comparisons
//! - `table` - Filtering, sorting and paging of derived rows
//! - `reports` - Report assembly by report type
//! - `refresh` - Change detection between report runs

pub mod budget;
pub mod compare;
pub mod events;
pub mod metrics;
pub mod period;
pub mod ranking;
pub mod refresh;
pub mod reports;
pub mod table;
