//! Row predicates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::collation::fold_case;
use super::{FieldValue, TableRow};
use crate::period::DateRange;

/// A single row condition. A filter is the AND of its predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Date field within the range, both ends inclusive.
    DateRange {
        /// Field name.
        field: String,
        /// Accepted dates.
        range: DateRange,
    },
    /// Text field exactly equal to `value`.
    Equals {
        /// Field name.
        field: String,
        /// Expected value.
        value: String,
    },
    /// Field containing `needle`, ignoring case.
    Contains {
        /// Field name.
        field: String,
        /// Substring to look for.
        needle: String,
    },
}

impl Predicate {
    /// Returns true when `row` satisfies this predicate.
    ///
    /// Rows missing the field never match.
    pub fn matches<T: TableRow>(&self, row: &T) -> bool {
        match self {
            Self::DateRange { field, range } => {
                matches!(row.field(field), Some(FieldValue::Date(date)) if range.contains_date(date))
            }
            Self::Equals { field, value } => match row.field(field) {
                Some(FieldValue::Text(text)) => text == *value,
                Some(FieldValue::Number(number)) => value
                    .trim()
                    .parse::<Decimal>()
                    .is_ok_and(|parsed| parsed == number),
                _ => false,
            },
            Self::Contains { field, needle } => {
                let haystack = match row.field(field) {
                    Some(FieldValue::Text(text)) => text,
                    Some(FieldValue::Number(number)) => number.to_string(),
                    Some(FieldValue::Date(date)) => date.to_string(),
                    None => return false,
                };
                fold_case(&haystack).contains(&fold_case(needle))
            }
        }
    }
}

/// Rows satisfying every predicate, in input order.
#[must_use]
pub fn filter<'a, T: TableRow>(rows: &'a [T], predicates: &[Predicate]) -> Vec<&'a T> {
    rows.iter()
        .filter(|row| predicates.iter().all(|predicate| predicate.matches(*row)))
        .collect()
}
