//! Foreign-key lookups across the snapshot's entity collections.

use std::collections::HashMap;

use super::types::{RawBook, RawUser, Snapshot, UNKNOWN_LABEL};

/// Index of users and books by id.
///
/// Every lookup falls back to [`UNKNOWN_LABEL`] so that records with dangling
/// references still count toward totals.
#[derive(Debug, Clone, Default)]
pub struct Directory<'a> {
    users: HashMap<&'a str, &'a RawUser>,
    books: HashMap<&'a str, &'a RawBook>,
}

impl<'a> Directory<'a> {
    /// Indexes a snapshot. Later duplicates of an id win.
    #[must_use]
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            users: snapshot
                .users
                .iter()
                .map(|user| (user.id.as_str(), user))
                .collect(),
            books: snapshot
                .books
                .iter()
                .map(|book| (book.id.as_str(), book))
                .collect(),
        }
    }

    /// Looks up a user.
    #[must_use]
    pub fn user(&self, id: Option<&str>) -> Option<&'a RawUser> {
        id.and_then(|id| self.users.get(id).copied())
    }

    /// Looks up a book.
    #[must_use]
    pub fn book(&self, id: Option<&str>) -> Option<&'a RawBook> {
        id.and_then(|id| self.books.get(id).copied())
    }

    /// Display name of a user.
    #[must_use]
    pub fn user_name(&self, id: Option<&str>) -> String {
        label(self.user(id).and_then(|user| user.display_name.as_deref()))
    }

    /// Class or cohort of a user.
    #[must_use]
    pub fn user_class(&self, id: Option<&str>) -> String {
        label(self.user(id).and_then(|user| user.student_class.as_deref()))
    }

    /// Title of a book.
    #[must_use]
    pub fn book_title(&self, id: Option<&str>) -> String {
        label(self.book(id).and_then(|book| book.title.as_deref()))
    }

    /// Author of a book.
    #[must_use]
    pub fn book_author(&self, id: Option<&str>) -> String {
        label(self.book(id).and_then(|book| book.author.as_deref()))
    }

    /// Category of a book.
    #[must_use]
    pub fn book_category(&self, id: Option<&str>) -> String {
        label(self.book(id).and_then(|book| book.category.as_deref()))
    }
}

/// Non-blank label or the placeholder.
#[must_use]
pub fn label(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_LABEL)
        .to_string()
}
