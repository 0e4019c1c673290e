//! APPLY for deleted instances. The tree is walked in reverse so children
//! are torn down before their parents.

use ncm_tree::{Scope, Tracked};

use super::{BaseHandler, TARGET, static_route_of};
use crate::handler::HandlerError;
use crate::schema::{
    AddressConfig, Config, InterfaceConfig, NetworkInstance, NetworkInstanceProcessor,
    NextHopEntry,
};

/// Queues the commands removing deleted configuration.
#[derive(Debug)]
pub struct DeleteHandler {
    pub(super) base: BaseHandler,
}

impl DeleteHandler {
    /// Wraps `base`.
    #[must_use]
    pub const fn new(base: BaseHandler) -> Self {
        Self { base }
    }
}

impl NetworkInstanceProcessor for DeleteHandler {
    fn network_instance(&mut self, scope: &Scope, ni: &NetworkInstance) -> Result<(), HandlerError> {
        tracing::debug!(target: TARGET, %scope, %ni, "instance removed");
        let mut commands = self.base.commands(scope);
        commands.container(false);
        // The saved configuration goes away with the container.
        commands.skip_finalize();
        Ok(())
    }

    fn config(&mut self, scope: &Scope, config: &Config) -> Result<(), HandlerError> {
        let mut commands = self.base.commands(scope);
        if config.one_of_change(&["route-distinguisher", "route-target"]) {
            commands.vrf(
                &config.route_distinguisher.to_string(),
                &config.route_target.to_string(),
                false,
            );
        }
        if let (true, Some(router_id)) = (config.get_change("router-id"), config.router_id) {
            commands.router_id(&router_id.to_string(), false);
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
                .vty_interface("lo", "ip address", &cidr, false);
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

        if config.get_changes(&["interface", "subinterface"]) {
            for (ip, prefix_length) in &subif.addresses {
                commands.vty_interface(id, "ip address", &format!("{ip}/{prefix_length}"), false);
            }
            commands.vty_interface(id, "shutdown", "", true);
        }

        if config.get_change("id") {
            commands.interface_sysctl(id, false);
            commands.interface_network(&ifname, mtu, false);
            if ifname.index() == 0 {
                commands.container_interface(id, false);
            }
        } else if config.get_change("subinterface") {
            commands.interface_network(&ifname, mtu, false);
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
            .static_route(destination, &gateway, false);
        Ok(())
    }
}
