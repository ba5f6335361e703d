//! Calendar months, academic years and bucketing of instants.

pub mod bucket;
pub mod labels;
pub mod range;

pub use bucket::{ACADEMIC_YEAR_MONTHS, Bucket, TimeBucketer};
pub use labels::month_name;
pub use range::{DateRange, YearMonth};
