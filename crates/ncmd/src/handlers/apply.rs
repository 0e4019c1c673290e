//! APPLY for created and modified instances.

use ncm_tree::{Scope, Tracked};

use super::{BaseHandler, TARGET, static_route_of};
use crate::handler::HandlerError;
use crate::schema::{
    AddressConfig, Config, InterfaceConfig, NetworkInstance, NetworkInstanceProcessor,
    NextHopEntry,
};

/// Queues the commands bringing new or changed configuration live.
#[derive(Debug)]
pub struct ApplyHandler {
    pub(super) base: BaseHandler,
}

impl ApplyHandler {
    /// Wraps `base`.
    #[must_use]
    pub const fn new(base: BaseHandler) -> Self {
        Self { base }
    }
}

impl NetworkInstanceProcessor for ApplyHandler {
    fn network_instance(&mut self, scope: &Scope, ni: &NetworkInstance) -> Result<(), HandlerError> {
        let mut commands = self.base.commands(scope);
        commands.container(true);
        commands.container_init(&ni.config)
    }

    fn config(&mut self, scope: &Scope, config: &Config) -> Result<(), HandlerError> {
        let mut commands = self.base.commands(scope);
        if config.one_of_change(&["route-distinguisher", "route-target"]) {
            commands.vrf(
                &config.route_distinguisher.to_string(),
                &config.route_target.to_string(),
                true,
            );
        }
        if let (true, Some(router_id)) = (config.get_change("router-id"), config.router_id) {
            commands.router_id(&router_id.to_string(), true);
            commands.vty_config(true);
        }
        Ok(())
    }

    fn loopback_address_config(
        &mut self,
        scope: &Scope,
        config: &AddressConfig,
    ) -> Result<(), HandlerError> {
        if let Some(cidr) = config.cidr() {
            self.base
                .commands(scope)
                .vty_interface("lo", "ip address", &cidr, true);
        }
        Ok(())
    }

    fn interface_config(
        &mut self,
        scope: &Scope,
        config: &InterfaceConfig,
    ) -> Result<(), HandlerError> {
        let id = scope.last();
        let inventory = self.base.inventory();
        let (ifname, subif) = inventory.subinterface(id)?;
        let mtu = subif.mtu.unwrap_or(self.base.mtu());
        let mut commands = self.base.commands(scope);

        if config.get_change("id") {
            if ifname.index() == 0 {
                commands.container_interface(id, true);
            }
            commands.interface_network(&ifname, mtu, true);
            commands.interface_sysctl(id, true);
        } else if config.get_change("subinterface") {
            commands.interface_network(&ifname, mtu, true);
        }

        if config.get_changes(&["interface", "subinterface"]) {
            commands.vty_interface(id, "shutdown", "", false);
            for (ip, prefix_length) in &subif.addresses {
                commands.vty_interface(id, "ip address", &format!("{ip}/{prefix_length}"), true);
            }
        }

        tracing::debug!(target: TARGET, %scope, %config, "interface queued");
        Ok(())
    }

    fn static_route_next_hop(
        &mut self,
        scope: &Scope,
        next_hop: &NextHopEntry,
    ) -> Result<(), HandlerError> {
        let (destination, gateway) = static_route_of(scope, &next_hop.config)?;
        self.base
            .commands(scope)
            .static_route(destination, &gateway, true);
        Ok(())
    }
}
