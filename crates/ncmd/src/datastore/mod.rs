//! The transactional datastore the daemon subscribes to.
//!
//! Only the surface the controller consumes is modelled here: module change
//! subscriptions, the lazy change iterator read during a callback, item
//! reads for cache refreshes and the running-to-startup copy used for
//! persistence. [`MemoryDatastore`] is the in-process binding.

mod memory;
mod replay;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

pub use memory::MemoryDatastore;
pub use replay::{Edit, ReplayError, ReplaySummary, Transaction, read_transactions, replay};

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::datastore");

/// Transaction stage a change notification is delivered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// The change is proposed; subscribers may reject it.
    Verify,
    /// The change was accepted and is now live in the running store.
    Apply,
    /// The change was rejected by some subscriber after this one verified it.
    Abort,
    /// The subscription was just established over existing configuration.
    Enabled,
}

/// Kind of change a single record describes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// A node appeared.
    Created,
    /// A leaf value changed.
    Modified,
    /// A node disappeared.
    Deleted,
    /// A list entry changed position.
    Moved,
}

/// Configuration store addressed by [`Datastore::copy_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Store {
    /// The live configuration.
    Running,
    /// The configuration loaded at boot.
    Startup,
}

/// One addressed value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Value {
    /// Full path, `/ns:name[key='value']/child/...`.
    pub path: String,
    /// Stringified payload; empty for containers and list entries.
    pub payload: String,
}

impl Value {
    /// Builds a value.
    #[must_use]
    pub fn new(path: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            payload: payload.into(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:?}", self.path, self.payload)
    }
}

/// A raw change as reported by the datastore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// What happened.
    pub operation: Operation,
    /// Value before the change; absent for creations.
    pub old: Option<Value>,
    /// Value after the change; absent for deletions.
    pub new: Option<Value>,
}

impl ChangeRecord {
    /// A creation of `value`.
    #[must_use]
    pub const fn created(value: Value) -> Self {
        Self {
            operation: Operation::Created,
            old: None,
            new: Some(value),
        }
    }

    /// A change from `old` to `new`.
    #[must_use]
    pub const fn modified(old: Value, new: Value) -> Self {
        Self {
            operation: Operation::Modified,
            old: Some(old),
            new: Some(new),
        }
    }

    /// A removal of `value`.
    #[must_use]
    pub const fn deleted(value: Value) -> Self {
        Self {
            operation: Operation::Deleted,
            old: Some(value),
            new: None,
        }
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => write!(f, "{}: {old} -> {new}", self.operation),
            (Some(value), None) | (None, Some(value)) => {
                write!(f, "{}: {value}", self.operation)
            }
            (None, None) => write!(f, "{}", self.operation),
        }
    }
}

/// Lazy sequence of change records.
pub type ChangeIter = Box<dyn Iterator<Item = ChangeRecord> + Send>;

/// Identifier of an established subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Delivery options for a subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeFlags {
    /// Skip the VERIFY and ABORT phases.
    pub apply_only: bool,
    /// Deliver the module's existing configuration once, as CREATED
    /// records in the ENABLED phase, when subscribing.
    pub enabled: bool,
}

/// Classification of a rejected callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorCode {
    /// The proposed configuration is invalid.
    ValidationFailed,
    /// The subscriber failed for another reason.
    Internal,
}

/// Error a subscriber returns from [`ModuleChangeHandler::module_change`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct CallbackError {
    /// Classification.
    pub code: ErrorCode,
    /// Reason shown to the operator.
    pub message: String,
}

impl CallbackError {
    /// Builds a callback error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Receiver of module change notifications.
#[cfg_attr(test, mockall::automock)]
pub trait ModuleChangeHandler: Send + Sync {
    /// Called once per phase of every transaction touching `module`.
    ///
    /// Changes are read back through [`Datastore::get_changes`] while the
    /// call is in progress.
    fn module_change(&self, module: &str, phase: Phase) -> Result<(), CallbackError>;
}

/// Failures reported by a datastore binding.
#[derive(Debug, Error)]
pub enum DatastoreError {
    /// No subscription exists for the identifier.
    #[error("unknown subscription {id}")]
    UnknownSubscription {
        /// Identifier passed in.
        id: SubscriptionId,
    },

    /// A subscriber rejected the transaction in the VERIFY phase.
    #[error("transaction rejected by {module}: {source}")]
    Rejected {
        /// Module whose subscriber rejected the change.
        module: String,
        /// The subscriber's error.
        #[source]
        source: CallbackError,
    },

    /// A subscriber failed in the APPLY phase. The change stays live.
    #[error("apply failed in {module}: {source}")]
    ApplyFailed {
        /// Module whose subscriber failed.
        module: String,
        /// The subscriber's error.
        #[source]
        source: CallbackError,
    },

    /// A path did not name a module.
    #[error("path {path:?} has no module prefix")]
    InvalidPath {
        /// Offending path.
        path: String,
    },

    /// A delete named a path holding nothing.
    #[error("nothing to delete at {path:?}")]
    NotFound {
        /// Offending path.
        path: String,
    },

    /// The binding itself failed.
    #[error("datastore failure: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

/// The datastore surface consumed by the controller.
#[cfg_attr(test, mockall::automock)]
pub trait Datastore: Send + Sync {
    /// Registers `handler` for changes to `module`.
    fn subscribe(
        &self,
        module: &str,
        flags: SubscribeFlags,
        handler: Arc<dyn ModuleChangeHandler>,
    ) -> Result<SubscriptionId, DatastoreError>;

    /// Removes a subscription.
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), DatastoreError>;

    /// Changes of the transaction being delivered, restricted to `filter`.
    fn get_changes(&self, filter: &str) -> Result<ChangeIter, DatastoreError>;

    /// Running-store values matching `filter`.
    fn get_items(&self, filter: &str) -> Result<Vec<Value>, DatastoreError>;

    /// Copies `module`'s configuration from `source` to `target`.
    fn copy_config(&self, module: &str, source: Store, target: Store)
    -> Result<(), DatastoreError>;
}

/// A live subscription. Dropping it unsubscribes.
pub struct Subscription {
    datastore: Arc<dyn Datastore>,
    id: SubscriptionId,
    module: String,
}

impl Subscription {
    /// Subscribes `handler` to `module` and keeps the registration alive
    /// for the lifetime of the returned handle.
    pub fn register(
        datastore: Arc<dyn Datastore>,
        module: &str,
        flags: SubscribeFlags,
        handler: Arc<dyn ModuleChangeHandler>,
    ) -> Result<Self, DatastoreError> {
        let id = datastore.subscribe(module, flags, handler)?;
        tracing::debug!(target: TARGET, %id, module, "subscribed");
        Ok(Self {
            datastore,
            id,
            module: module.to_owned(),
        })
    }

    /// The subscription identifier.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The subscribed module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Err(error) = self.datastore.unsubscribe(self.id) {
            tracing::warn!(
                target: TARGET,
                id = %self.id,
                module = %self.module,
                %error,
                "unsubscribe failed"
            );
        }
    }
}

/// Whether `path` is selected by `filter`.
///
/// A filter ending in `*` selects every path starting with the text before
/// it. Otherwise it selects the node it names and everything below it.
pub(crate) fn filter_matches(filter: &str, path: &str) -> bool {
    if let Some(prefix) = filter.strip_suffix('*') {
        return path.starts_with(prefix);
    }
    path.strip_prefix(filter)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('['))
}

/// Module named by the first segment of `path`.
pub(crate) fn module_of(path: &str) -> Option<&str> {
    let body = path.strip_prefix('/')?;
    let (module, _) = body.split_once(':')?;
    (!module.is_empty() && !module.contains('/')).then_some(module)
}
