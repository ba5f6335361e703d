//! Filtering, sorting and paging of derived result rows.
//!
//! Every operation borrows its input and returns a new list; the rows a
//! report derived are never reordered or trimmed in place.

pub mod collation;
pub mod filter;
pub mod sort;


pub use collation::{collate, fold_case};
pub use filter::{Predicate, filter};
pub use sort::{SortDirection, SortSpec, sort};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shelfwise_shared::types::{PageRequest, PageResponse};

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Free text, compared under [`collate`].
    Text(String),
    /// A number, compared numerically.
    Number(Decimal),
    /// A calendar date.
    Date(NaiveDate),
}

/// A row that exposes its cells by field name.
pub trait TableRow {
    /// Returns the value of `field`, or `None` when the row has no such cell.
    fn field(&self, field: &str) -> Option<FieldValue>;
}

/// Filters, sorts and pages `rows` in one go.
#[must_use]
pub fn view<T>(
    rows: &[T],
    predicates: &[Predicate],
    sort_spec: Option<&SortSpec>,
    page: PageRequest,
) -> PageResponse<T>
where
    T: TableRow + Clone,
{
    let filtered = filter(rows, predicates);
    let ordered = match sort_spec {
        Some(spec) => sort(filtered, spec),
        None => filtered,
    };
    let paged = PageResponse::paginate(&ordered, page);

    PageResponse {
        data: paged.data.into_iter().cloned().collect(),
        meta: paged.meta,
    }
}
