//! Report assembly.
//!
//! A [`ReportAssembler`] turns a snapshot and a [`ReportRequest`] into one
//! serializable [`Report`]:
//! - Trend series over trailing months or the academic year
//! - Distributions with imbalance and low-stock advisories
//! - Top and bottom rankings
//! - Budget summary and the paged transaction table
//! - Period and category comparisons

pub mod error;
pub mod service;
pub mod types;


pub use error::ReportError;
pub use service::ReportAssembler;
pub use types::*;
