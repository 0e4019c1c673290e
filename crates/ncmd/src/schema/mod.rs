//! The network-instance configuration tree.
//!
//! Every node declares its fields once through
//! [`FieldsBuilder`](ncm_tree::FieldsBuilder). The same table drives
//! population from change records and dispatch into a
//! [`NetworkInstanceProcessor`].
//!
//! ```text
//! network-instance[name]
//! ├── config { name, type, description, router-id, route-distinguisher, route-target }
//! ├── loopbacks/loopback[id]
//! │   ├── config { id }
//! │   └── addresses/address[index]/config { index, ip, prefix-length }
//! ├── interfaces/interface[id]/config { id, interface, subinterface }
//! └── protocols/protocol[identifier][name]
//!     ├── config { identifier, name }
//!     └── static-routes/static[ip][prefix-length]
//!         ├── config { ip, prefix-length }
//!         └── next-hops/next-hop[index]/config { index, next-hop }
//! ```

mod interface;
mod loopback;
mod network_instance;
mod protocol;
mod types;

use ncm_tree::Scope;

pub use interface::{Interface, InterfaceConfig};
pub use loopback::{Address, AddressConfig, Loopback, LoopbackConfig};
pub use network_instance::{Config, NetworkInstance};
pub use protocol::{
    NextHopConfig, NextHopEntry, Protocol, ProtocolConfig, ProtocolKey, StaticRoute,
    StaticRouteConfig, StaticRouteKey,
};
pub use types::{InstallProtocolType, NetworkInstanceType, NextHop, RouteDistinguisher};

use crate::handler::HandlerError;

/// Callbacks fired while walking a changed network instance.
///
/// Every callback defaults to a no-op so handlers only implement the steps
/// they act on. `scope` holds the list keys leading to the node: the
/// instance name first, then loopback, interface, protocol, route and
/// next-hop keys as applicable.
#[expect(unused_variables, reason = "default callbacks ignore their arguments")]
pub trait NetworkInstanceProcessor {
    /// The instance key was written.
    fn network_instance(&mut self, scope: &Scope, ni: &NetworkInstance) -> Result<(), HandlerError> {
        Ok(())
    }

    /// The instance config changed.
    fn config(&mut self, scope: &Scope, config: &Config) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A loopback key was written.
    fn loopback(&mut self, scope: &Scope, lo: &Loopback) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A loopback config changed.
    fn loopback_config(
        &mut self,
        scope: &Scope,
        config: &LoopbackConfig,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A loopback address key was written.
    fn loopback_address(&mut self, scope: &Scope, addr: &Address) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A loopback address config changed.
    fn loopback_address_config(
        &mut self,
        scope: &Scope,
        config: &AddressConfig,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// An interface key was written.
    fn interface(&mut self, scope: &Scope, iface: &Interface) -> Result<(), HandlerError> {
        Ok(())
    }

    /// An interface config changed.
    fn interface_config(
        &mut self,
        scope: &Scope,
        config: &InterfaceConfig,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Both protocol keys were written.
    fn protocol(&mut self, scope: &Scope, protocol: &Protocol) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A protocol config changed.
    fn protocol_config(
        &mut self,
        scope: &Scope,
        config: &ProtocolConfig,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Something below a protocol's static routes changed.
    fn protocol_static_routes(
        &mut self,
        scope: &Scope,
        protocol: &Protocol,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Both static-route keys were written.
    fn static_route(&mut self, scope: &Scope, route: &StaticRoute) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A static-route config changed.
    fn static_route_config(
        &mut self,
        scope: &Scope,
        config: &StaticRouteConfig,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A next-hop key was written.
    fn static_route_next_hop(
        &mut self,
        scope: &Scope,
        next_hop: &NextHopEntry,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// A next-hop config changed.
    fn static_route_next_hop_config(
        &mut self,
        scope: &Scope,
        config: &NextHopConfig,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}
