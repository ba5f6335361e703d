//! Stable single-key sorting.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::collation::collate;
use super::{FieldValue, TableRow};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Parses `asc`/`desc`, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Which field to sort on, and which way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field name.
    pub key: String,
    /// Direction.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    /// Creates a sort spec.
    #[must_use]
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

/// Returns `rows` ordered by `spec`. Equal keys keep their relative order.
///
/// Rows without the field sort before rows that have it (after them when
/// descending).
#[must_use]
pub fn sort<'a, T: TableRow>(rows: Vec<&'a T>, spec: &SortSpec) -> Vec<&'a T> {
    let mut keyed: Vec<(Option<FieldValue>, &'a T)> = rows
        .into_iter()
        .map(|row| (row.field(&spec.key), row))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = compare(a.as_ref(), b.as_ref());
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, row)| row).collect()
}

fn compare(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(FieldValue::Number(a)), Some(FieldValue::Number(b))) => a.cmp(b),
        (Some(FieldValue::Date(a)), Some(FieldValue::Date(b))) => a.cmp(b),
        (Some(FieldValue::Text(a)), Some(FieldValue::Text(b))) => collate(a, b),
        (a, b) => rank(a).cmp(&rank(b)),
    }
}

const fn rank(value: Option<&FieldValue>) -> u8 {
    match value {
        None => 0,
        Some(FieldValue::Number(_)) => 1,
        Some(FieldValue::Date(_)) => 2,
        Some(FieldValue::Text(_)) => 3,
    }
}
