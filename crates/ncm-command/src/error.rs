//! Error types for command execution.

use thiserror::Error;

/// Failure of a single downstream action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure.
    #[error("{program} exited with {status}: {output}")]
    Exit {
        /// Program that failed.
        program: String,
        /// Rendered exit status.
        status: String,
        /// Combined stdout and stderr.
        output: String,
    },

    /// An in-process action failed.
    #[error("{message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl ActionError {
    /// Builds an [`ActionError::Failed`].
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Failures surfaced by [`CommandBatch`](crate::CommandBatch).
#[derive(Debug, Error)]
pub enum CommandError {
    /// A `do` action failed. The applied prefix has already been undone.
    #[error("command {index} ({command}) failed: {source}")]
    Commit {
        /// Batch position of the failing command.
        index: usize,
        /// Description of the failing action.
        command: String,
        /// Action failure.
        #[source]
        source: ActionError,
    },

    /// A `finalize` action failed after every `do` succeeded.
    #[error("finalize of command {index} ({command}) failed: {source}")]
    Finalize {
        /// Batch position of the failing command.
        index: usize,
        /// Description of the failing action.
        command: String,
        /// Action failure.
        #[source]
        source: ActionError,
    },

    /// An `undo` action failed. Only ever logged.
    #[error("undo of command {index} ({command}) failed: {source}")]
    Rollback {
        /// Batch position of the failing command.
        index: usize,
        /// Description of the failing action.
        command: String,
        /// Action failure.
        #[source]
        source: ActionError,
    },
}
