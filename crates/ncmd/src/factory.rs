//! Maps `(phase, operation)` cells to handlers.

use std::sync::Arc;

use ncm_config::Config;

use crate::datastore::{Operation, Phase};
use crate::handler::{ChangeHandler, HandlerOpt};
use crate::handlers::{
    AnyHandler, ApplyHandler, BaseHandler, DeleteHandler, Tools, VerifyHandler,
};
use crate::inventory::Inventory;
use crate::schema::NetworkInstance;

/// Builds the handler for one `(phase, operation)` cell.
///
/// A factory is shared across notifications and holds no per-notification
/// state; everything a handler needs for one notification is passed in.
pub trait HandlerFactory<N>: Send + Sync {
    /// Returns the handler for the cell, or `None` when the cell needs no
    /// work at all.
    fn new_handler(
        &self,
        phase: Phase,
        operation: Operation,
        inventory: Arc<Inventory>,
    ) -> Option<Box<dyn ChangeHandler<N>>>;
}

/// Factory for network-instance handlers.
#[derive(Debug, Clone)]
pub struct NiHandlerFactory {
    tools: Arc<Tools>,
    dry_run: bool,
    mtu: u32,
}

impl NiHandlerFactory {
    /// Creates a factory issuing commands through `tools`.
    #[must_use]
    pub const fn new(tools: Arc<Tools>, dry_run: bool, mtu: u32) -> Self {
        Self {
            tools,
            dry_run,
            mtu,
        }
    }

    /// Creates a factory from daemon configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(Tools::from_config(config)),
            config.dry_run(),
            config.container_mtu(),
        )
    }
}

impl HandlerFactory<NetworkInstance> for NiHandlerFactory {
    fn new_handler(
        &self,
        phase: Phase,
        operation: Operation,
        inventory: Arc<Inventory>,
    ) -> Option<Box<dyn ChangeHandler<NetworkInstance>>> {
        let base = BaseHandler::new(phase, operation, Arc::clone(&self.tools), inventory);
        let mut handler: Box<dyn ChangeHandler<NetworkInstance>> = match (phase, operation) {
            (
                Phase::Verify,
                Operation::Created | Operation::Modified | Operation::Deleted,
            ) => Box::new(VerifyHandler::new(base)),
            (Phase::Apply, Operation::Created | Operation::Modified) => {
                Box::new(ApplyHandler::new(base))
            }
            (Phase::Apply, Operation::Deleted) => Box::new(DeleteHandler::new(base)),
            _ => Box::new(AnyHandler::new(base)),
        };
        handler.set_opt(HandlerOpt::DryRun(self.dry_run));
        handler.set_opt(HandlerOpt::Mtu(self.mtu));
        Some(handler)
    }
}
