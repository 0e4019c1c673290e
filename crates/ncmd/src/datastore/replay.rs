//! JSON-lines transaction replay over the in-memory datastore.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{DatastoreError, MemoryDatastore, TARGET};

/// One edit of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    /// Writes `value` at `path`, creating missing list entries.
    Set {
        /// Leaf or list-entry path.
        path: String,
        /// Stringified payload.
        #[serde(default)]
        value: String,
    },
    /// Removes `path` and everything below it.
    Delete {
        /// Node path.
        path: String,
    },
}

/// A group of edits committed atomically.
///
/// ```json
/// {"label": "pe1", "edits": [{"op": "set", "path": "/m:a/b", "value": "1"}]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Transaction {
    /// Name used in logs.
    #[serde(default)]
    pub label: Option<String>,
    /// Edits in application order.
    pub edits: Vec<Edit>,
}

/// Failures while reading a replay file.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A line is not a transaction.
    #[error("{path}:{line}: {source}")]
    Parse {
        /// File being read.
        path: Utf8PathBuf,
        /// One-based line number.
        line: usize,
        /// Decoder diagnostic.
        #[source]
        source: serde_json::Error,
    },
}

/// Reads one transaction per line. Blank lines and lines starting with `#`
/// are skipped.
pub fn read_transactions(path: &Utf8Path) -> Result<Vec<Transaction>, ReplayError> {
    let text = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| ReplayError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                source,
            })
        })
        .collect()
}

/// Outcome counts of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Transactions committed and applied everywhere.
    pub applied: usize,
    /// Transactions rejected in the VERIFY phase.
    pub rejected: usize,
    /// Transactions committed whose APPLY failed, or that were malformed.
    pub failed: usize,
}

impl ReplaySummary {
    /// Whether every transaction applied.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.rejected == 0 && self.failed == 0
    }
}

/// Commits `transactions` in order. A failing transaction does not stop the
/// ones after it.
pub fn replay(datastore: &MemoryDatastore, transactions: &[Transaction]) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for (index, transaction) in transactions.iter().enumerate() {
        let label = transaction
            .label
            .clone()
            .unwrap_or_else(|| format!("#{}", index + 1));
        match datastore.commit(&transaction.edits) {
            Ok(()) => {
                summary.applied += 1;
                tracing::info!(target: TARGET, transaction = %label, "transaction applied");
            }
            Err(error @ DatastoreError::Rejected { .. }) => {
                summary.rejected += 1;
                tracing::warn!(target: TARGET, transaction = %label, %error, "transaction rejected");
            }
            Err(error) => {
                summary.failed += 1;
                tracing::error!(target: TARGET, transaction = %label, %error, "transaction failed");
            }
        }
    }
    summary
}
