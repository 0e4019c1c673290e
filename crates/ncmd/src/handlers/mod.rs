//! Network-instance handlers.
//!
//! Every handler wraps a [`BaseHandler`] holding the command batch, the tool
//! paths and the inventory snapshot of the current notification. The
//! variants differ only in the [`NetworkInstanceProcessor`] callbacks they
//! override and in the direction they walk the changed tree:
//!
//! | Handler           | Cells                           | Walk    |
//! |-------------------|---------------------------------|---------|
//! | [`VerifyHandler`] | VERIFY CREATED/MODIFIED/DELETED | forward |
//! | [`ApplyHandler`]  | APPLY CREATED/MODIFIED          | forward |
//! | [`DeleteHandler`] | APPLY DELETED                   | reverse |
//! | [`AnyHandler`]    | everything else                 | none    |

mod apply;
mod commands;
mod delete;
mod verify;

use std::sync::Arc;

use ncm_command::CommandBatch;
use ncm_config::DEFAULT_CONTAINER_MTU;
use ncm_tree::{Scope, process_node};

pub use apply::ApplyHandler;
pub use commands::{NiUpdate, Tools};
pub use delete::DeleteHandler;
pub use verify::VerifyHandler;

use self::commands::NiCommands;
use crate::datastore::{Operation, Phase};
use crate::handler::{ChangeHandler, HandlerError, HandlerOpt};
use crate::inventory::Inventory;
use crate::schema::{NetworkInstance, NetworkInstanceProcessor, NextHop, NextHopConfig};

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handlers");

/// State shared by every network-instance handler.
#[derive(Debug)]
pub struct BaseHandler {
    phase: Phase,
    operation: Operation,
    tools: Arc<Tools>,
    inventory: Arc<Inventory>,
    mtu: u32,
    batch: CommandBatch<NiUpdate>,
}

impl BaseHandler {
    /// Creates the shared state for the `(phase, operation)` cell.
    #[must_use]
    pub fn new(
        phase: Phase,
        operation: Operation,
        tools: Arc<Tools>,
        inventory: Arc<Inventory>,
    ) -> Self {
        Self {
            phase,
            operation,
            tools,
            inventory,
            mtu: DEFAULT_CONTAINER_MTU,
            batch: CommandBatch::new(format!("ni/{phase}/{operation}")),
        }
    }

    /// Phase the handler was built for.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Operation the handler was built for.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// MTU used for interfaces without one in the inventory.
    #[must_use]
    pub const fn mtu(&self) -> u32 {
        self.mtu
    }

    /// The commands queued by the last `begin`.
    #[must_use]
    pub const fn batch(&self) -> &CommandBatch<NiUpdate> {
        &self.batch
    }

    pub(crate) fn inventory(&self) -> Arc<Inventory> {
        Arc::clone(&self.inventory)
    }

    pub(crate) fn commands<'a>(&'a mut self, scope: &'a Scope) -> NiCommands<'a> {
        NiCommands::new(&self.tools, scope.instance(), &mut self.batch)
    }

    const fn set_opt(&mut self, opt: HandlerOpt) {
        match opt {
            HandlerOpt::DryRun(dry_run) => self.batch.set_dry_run(dry_run),
            HandlerOpt::Mtu(mtu) => self.mtu = mtu,
        }
    }

    fn commit(&mut self) -> Result<(), HandlerError> {
        tracing::debug!(
            target: TARGET,
            phase = %self.phase,
            operation = %self.operation,
            commands = self.batch.len(),
            "commit"
        );
        self.batch.commit().map_err(HandlerError::from)
    }

    fn rollback(&mut self) {
        tracing::debug!(
            target: TARGET,
            phase = %self.phase,
            operation = %self.operation,
            "rollback"
        );
        self.batch.rollback();
    }
}

/// Destination and gateway of the static route `config` belongs to.
fn static_route_of<'a>(
    scope: &'a Scope,
    config: &NextHopConfig,
) -> Result<(&'a str, String), HandlerError> {
    let destination = scope
        .keys()
        .get(2)
        .map(String::as_str)
        .ok_or_else(|| HandlerError::invalid(scope, "next-hop outside a static route"))?;
    let gateway = match config.next_hop {
        Some(NextHop::Ip(ip)) => ip.to_string(),
        Some(NextHop::Drop) => "null0".to_owned(),
        Some(NextHop::LocalLink) => {
            return Err(HandlerError::Unsupported {
                what: "next-hop",
                value: NextHop::LocalLink.to_string(),
            });
        }
        None => return Err(HandlerError::invalid(scope, "next-hop not specified")),
    };
    Ok((destination, gateway))
}

/// Walks `entity` with `handler`, starting from a cleared batch. The batch
/// is cleared again when the walk fails.
fn walk<H>(
    handler: &mut H,
    reverse: bool,
    name: &str,
    entity: &NetworkInstance,
) -> Result<(), HandlerError>
where
    H: NetworkInstanceProcessor + AsMut<BaseHandler> + 'static,
{
    let base = handler.as_mut();
    tracing::debug!(
        target: TARGET,
        phase = %base.phase,
        operation = %base.operation,
        instance = name,
        entity = %entity,
        "begin"
    );
    base.batch.clear();
    let result = process_node::<NetworkInstance>(handler, reverse, &Scope::root(name), entity);
    if result.is_err() {
        handler.as_mut().batch.clear();
    }
    result
}

/// Handler for cells that need no downstream work.
#[derive(Debug)]
pub struct AnyHandler {
    base: BaseHandler,
}

impl AnyHandler {
    /// Wraps `base`.
    #[must_use]
    pub const fn new(base: BaseHandler) -> Self {
        Self { base }
    }
}

impl NetworkInstanceProcessor for AnyHandler {}

impl ChangeHandler<NetworkInstance> for AnyHandler {
    fn begin(&mut self, name: &str, entity: &NetworkInstance) -> Result<(), HandlerError> {
        tracing::debug!(
            target: TARGET,
            phase = %self.base.phase,
            operation = %self.base.operation,
            instance = name,
            entity = %entity,
            "ignored"
        );
        Ok(())
    }

    fn commit(&mut self) -> Result<(), HandlerError> {
        Ok(())
    }

    fn rollback(&mut self) {}

    fn set_opt(&mut self, opt: HandlerOpt) {
        self.base.set_opt(opt);
    }
}

macro_rules! impl_base_handler {
    ($($handler:ty => $reverse:expr),+ $(,)?) => {
        $(
            impl AsMut<BaseHandler> for $handler {
                fn as_mut(&mut self) -> &mut BaseHandler {
                    &mut self.base
                }
            }

            impl ChangeHandler<NetworkInstance> for $handler {
                fn begin(
                    &mut self,
                    name: &str,
                    entity: &NetworkInstance,
                ) -> Result<(), HandlerError> {
                    walk(self, $reverse, name, entity)
                }

                fn commit(&mut self) -> Result<(), HandlerError> {
                    self.base.commit()
                }

                fn rollback(&mut self) {
                    self.base.rollback();
                }

                fn set_opt(&mut self, opt: HandlerOpt) {
                    self.base.set_opt(opt);
                }
            }
        )+
    };
}

impl_base_handler!(
    VerifyHandler => false,
    ApplyHandler => false,
    DeleteHandler => true,
);
