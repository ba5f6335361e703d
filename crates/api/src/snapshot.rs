//! Snapshot loading collaborator.
//!
//! Storage is someone else's concern; the engine only needs one immutable
//! [`Snapshot`] per report run.

use std::path::PathBuf;

use async_trait::async_trait;
use shelfwise_core::events::Snapshot;
use thiserror::Error;
use tracing::debug;

/// Snapshot loading failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot file could not be read.
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file is not valid JSON of the expected shape.
    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// The source is unavailable.
    #[error("Snapshot source unavailable: {0}")]
    Unavailable(String),
}

/// Produces the records one report run works on.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Loads a fresh snapshot.
    async fn load(&self) -> Result<Snapshot, SnapshotError>;
}

/// Reads a JSON snapshot file on every load, optionally narrowed to one campus.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    campus_id: Option<String>,
}

impl JsonFileSource {
    /// Creates a file source.
    pub fn new(path: impl Into<PathBuf>, campus_id: Option<String>) -> Self {
        Self {
            path: path.into(),
            campus_id,
        }
    }
}

#[async_trait]
impl SnapshotSource for JsonFileSource {
    async fn load(&self) -> Result<Snapshot, SnapshotError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SnapshotError::Read {
                path: self.path.display().to_string(),
                source,
            })?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;

        let snapshot = match self.campus_id.as_deref() {
            Some(campus) => scope_to_campus(snapshot, campus),
            None => snapshot,
        };
        debug!(
            loans = snapshot.loans.len(),
            transactions = snapshot.transactions.len(),
            users = snapshot.users.len(),
            books = snapshot.books.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }
}

/// Serves the same snapshot on every load.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    snapshot: Snapshot,
}

impl InMemorySource {
    /// Wraps a snapshot.
    pub const fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl SnapshotSource for InMemorySource {
    async fn load(&self) -> Result<Snapshot, SnapshotError> {
        Ok(self.snapshot.clone())
    }
}

/// Keeps only records of one campus. Records without a campus are kept.
pub fn scope_to_campus(mut snapshot: Snapshot, campus: &str) -> Snapshot {
    let keep = |record_campus: Option<&str>| record_campus.is_none_or(|id| id == campus);
    snapshot.loans.retain(|loan| keep(loan.campus_id.as_deref()));
    snapshot
        .transactions
        .retain(|tx| keep(tx.campus_id.as_deref()));
    snapshot.users.retain(|user| keep(user.campus_id.as_deref()));
    snapshot.books.retain(|book| keep(book.campus_id.as_deref()));
    snapshot
        .reward_claims
        .retain(|claim| keep(claim.campus_id.as_deref()));
    snapshot
}
