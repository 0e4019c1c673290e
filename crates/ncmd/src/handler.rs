//! The handler lifecycle driven by the controller.

use ncm_command::CommandError;
use thiserror::Error;

use crate::inventory::InventoryError;

/// Cross-cutting option applied to a freshly built handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOpt {
    /// Log commands instead of running them.
    DryRun(bool),
    /// MTU used for attached interfaces without their own.
    Mtu(u32),
}

/// Failures raised while handling one changed entity.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The proposed configuration is invalid.
    #[error("{scope}: {reason}")]
    Invalid {
        /// List keys of the offending node.
        scope: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The configuration asks for something this daemon cannot do.
    #[error("unsupported {what}: {value}")]
    Unsupported {
        /// Setting being applied.
        what: &'static str,
        /// Value received.
        value: String,
    },

    /// A downstream command failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// An interface lookup failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl HandlerError {
    /// Builds a [`HandlerError::Invalid`].
    #[must_use]
    pub fn invalid(scope: impl ToString, reason: impl Into<String>) -> Self {
        Self::Invalid {
            scope: scope.to_string(),
            reason: reason.into(),
        }
    }
}

/// Turns one changed top-level entity into downstream work.
///
/// A handler is bound to one `(phase, operation)` cell. The controller calls
/// [`begin`](Self::begin) for an entity, then [`commit`](Self::commit), and
/// [`rollback`](Self::rollback) when either fails.
pub trait ChangeHandler<N>: Send {
    /// Validates `entity` and fills the handler's command batch.
    fn begin(&mut self, name: &str, entity: &N) -> Result<(), HandlerError>;

    /// Runs the batch filled by `begin`.
    fn commit(&mut self) -> Result<(), HandlerError>;

    /// Undoes whatever the last commit applied.
    fn rollback(&mut self);

    /// Applies a cross-cutting option.
    fn set_opt(&mut self, opt: HandlerOpt);
}
