//! Common types used across the application.

pub mod pagination;

pub use pagination::{PageMeta, PageRequest, PageResponse};

#[cfg(test)]
mod pagination_tests;
