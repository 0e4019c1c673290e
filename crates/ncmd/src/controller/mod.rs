//! Ties datastore notifications to handler lifecycles.
//!
//! For every notification the controller reads the module's pending
//! changes, folds them into a [`ChangeSet`], refreshes the [`Inventory`]
//! and then drives one handler per changed top-level entity through
//! `begin`, `commit` and, on failure, `rollback`. Operations are processed
//! MODIFIED first, then DELETED, then CREATED.

use std::fmt;
use std::sync::Arc;
use std::thread;

use ncm_tree::{ListEntry, TreeError};
use thiserror::Error;

use crate::changeset::ChangeSet;
use crate::datastore::{
    CallbackError, Datastore, DatastoreError, ErrorCode, ModuleChangeHandler, Operation, Phase,
    Store, SubscribeFlags, Subscription,
};
use crate::factory::HandlerFactory;
use crate::handler::{ChangeHandler, HandlerError};
use crate::health::HealthReporter;
use crate::inventory::{Inventory, InventoryError};

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::controller");

/// Order in which the operations of one notification are handled.
pub const OPERATION_ORDER: [Operation; 3] =
    [Operation::Modified, Operation::Deleted, Operation::Created];

/// Failures while handling one notification.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Reading changes from the datastore failed.
    #[error(transparent)]
    Datastore(#[from] DatastoreError),

    /// A change record did not fit the configuration tree.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The interface snapshot could not be refreshed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// A handler rejected or failed to apply an entity.
    #[error("{phase} {operation} {instance}: {source}")]
    Handler {
        /// Phase being handled.
        phase: Phase,
        /// Operation being handled.
        operation: Operation,
        /// Key of the failing entity.
        instance: String,
        /// The handler's error.
        #[source]
        source: Box<HandlerError>,
    },
}

/// Subscriber driving handlers for one datastore module.
pub struct ChangeController<N: ListEntry> {
    datastore: Arc<dyn Datastore>,
    factory: Arc<dyn HandlerFactory<N>>,
    module: String,
    persist: bool,
    reporter: Arc<dyn HealthReporter>,
}

impl<N: ListEntry> fmt::Debug for ChangeController<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeController")
            .field("module", &self.module)
            .field("persist", &self.persist)
            .finish_non_exhaustive()
    }
}

impl<N: ListEntry> ChangeController<N> {
    /// Creates a controller for `module`. Persistence is off.
    pub fn new(
        datastore: Arc<dyn Datastore>,
        factory: Arc<dyn HandlerFactory<N>>,
        module: impl Into<String>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            datastore,
            factory,
            module: module.into(),
            persist: false,
            reporter,
        }
    }

    /// Copies running to startup in the background after each successful
    /// APPLY when `persist` is set.
    #[must_use]
    pub const fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// The module this controller handles.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Registers `controller` with its datastore. Notifications flow until
    /// the returned handle is dropped.
    pub fn subscribe(
        controller: &Arc<Self>,
        flags: SubscribeFlags,
    ) -> Result<Subscription, DatastoreError> {
        let handler: Arc<dyn ModuleChangeHandler> = Arc::clone(controller) as _;
        let subscription = Subscription::register(
            Arc::clone(&controller.datastore),
            &controller.module,
            flags,
            handler,
        )?;
        controller.reporter.subscribed(&controller.module);
        Ok(subscription)
    }

    /// Handles the pending changes of one notification.
    pub fn handle(&self, phase: Phase) -> Result<(), ControllerError> {
        let filter = format!("/{}:*", self.module);
        let mut changes = ChangeSet::<N>::new();
        for record in self.datastore.get_changes(&filter)? {
            changes.unmarshal(&record)?;
        }
        if changes.is_empty() {
            tracing::debug!(target: TARGET, module = %self.module, %phase, "no entities changed");
            return Ok(());
        }

        let inventory = Arc::new(Inventory::load(self.datastore.as_ref())?);
        for operation in OPERATION_ORDER {
            let Some(entities) = changes.entities(operation) else {
                continue;
            };
            for (key, entity) in entities {
                let Some(mut handler) =
                    self.factory
                        .new_handler(phase, operation, Arc::clone(&inventory))
                else {
                    continue;
                };
                let instance = key.to_string();
                drive(handler.as_mut(), &instance, entity).map_err(|source| {
                    ControllerError::Handler {
                        phase,
                        operation,
                        instance,
                        source: Box::new(source),
                    }
                })?;
            }
        }
        Ok(())
    }

    fn persist_in_background(&self) {
        let datastore = Arc::clone(&self.datastore);
        let reporter = Arc::clone(&self.reporter);
        let module = self.module.clone();
        let spawned = thread::Builder::new()
            .name("ncmd-persist".to_owned())
            .spawn(move || {
                match datastore.copy_config(&module, Store::Running, Store::Startup) {
                    Ok(()) => reporter.persisted(&module),
                    Err(error) => reporter.persistence_failed(&module, &error),
                }
            });
        if let Err(error) = spawned {
            tracing::error!(target: TARGET, module = %self.module, %error, "failed to start persistence");
        }
    }
}

/// Runs one handler over one entity, rolling back when either step fails.
fn drive<N>(
    handler: &mut dyn ChangeHandler<N>,
    instance: &str,
    entity: &N,
) -> Result<(), HandlerError> {
    if let Err(error) = handler.begin(instance, entity) {
        handler.rollback();
        return Err(error);
    }
    if let Err(error) = handler.commit() {
        tracing::warn!(target: TARGET, instance, %error, "commit failed, rolling back");
        handler.rollback();
        return Err(error);
    }
    Ok(())
}

impl<N: ListEntry> ModuleChangeHandler for ChangeController<N> {
    fn module_change(&self, module: &str, phase: Phase) -> Result<(), CallbackError> {
        match self.handle(phase) {
            Ok(()) => {
                self.reporter.notification_processed(module, phase);
                if phase == Phase::Apply && self.persist {
                    self.persist_in_background();
                }
                Ok(())
            }
            Err(error) => {
                self.reporter.notification_rejected(module, phase, &error);
                let code = if phase == Phase::Verify {
                    ErrorCode::ValidationFailed
                } else {
                    ErrorCode::Internal
                };
                Err(CallbackError::new(code, error.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests;
