//! Shared configuration, errors, and pagination types for Shelfwise.
//!
//! This crate provides common types used across all other crates:
//! - Pagination types for derived result tables
//! - Application-wide error types
//! - Configuration management, including the analytics thresholds

pub mod config;
pub mod error;
pub mod types;

pub use config::{AnalyticsConfig, AppConfig};
pub use error::{AppError, AppResult};
