//! VERIFY-phase checks. Nothing is queued; a failed check rejects the
//! transaction before anything touches the live system.

use std::net::IpAddr;

use ncm_tree::{Scope, Tracked};

use super::{BaseHandler, TARGET};
use crate::handler::HandlerError;
use crate::schema::{
    AddressConfig, InstallProtocolType, Interface, InterfaceConfig, NetworkInstanceProcessor,
    NextHop, NextHopConfig, NextHopEntry, Protocol, StaticRouteConfig,
};

/// Validates proposed network-instance changes.
#[derive(Debug)]
pub struct VerifyHandler {
    pub(super) base: BaseHandler,
}

impl VerifyHandler {
    /// Wraps `base`.
    #[must_use]
    pub const fn new(base: BaseHandler) -> Self {
        Self { base }
    }
}

fn verify_prefix(scope: &Scope, ip: Option<IpAddr>, prefix_length: u8) -> Result<(), HandlerError> {
    let max = match ip {
        Some(IpAddr::V4(_)) => 32,
        Some(IpAddr::V6(_)) => 128,
        None => return Err(HandlerError::invalid(scope, "ip not specified")),
    };
    if prefix_length > max {
        return Err(HandlerError::invalid(
            scope,
            format!("invalid prefix-length {prefix_length} for {max}-bit address"),
        ));
    }
    Ok(())
}

fn verify_address<T: Tracked>(
    scope: &Scope,
    config: &T,
    ip: Option<IpAddr>,
    prefix_length: u8,
) -> Result<(), HandlerError> {
    if !config.get_changes(&["ip", "prefix-length"]) {
        return Err(HandlerError::invalid(
            scope,
            format!("ip or prefix-length not specified ({})", config.changes()),
        ));
    }
    verify_prefix(scope, ip, prefix_length)
}

impl NetworkInstanceProcessor for VerifyHandler {
    fn loopback_address_config(
        &mut self,
        scope: &Scope,
        config: &AddressConfig,
    ) -> Result<(), HandlerError> {
        verify_address(scope, config, config.ip, config.prefix_length)
    }

    fn interface(&mut self, scope: &Scope, iface: &Interface) -> Result<(), HandlerError> {
        let inventory = self.base.inventory();
        let (ifname, _) = inventory.subinterface(&iface.id)?;
        if ifname.index() == 0 {
            inventory.interface(ifname.device())?;
        }
        tracing::debug!(target: TARGET, %scope, "interface verified");
        Ok(())
    }

    fn interface_config(
        &mut self,
        scope: &Scope,
        config: &InterfaceConfig,
    ) -> Result<(), HandlerError> {
        let refs = ["interface", "subinterface"];
        if config.get_changes(&refs) {
            let ifname = config.ifname().to_string();
            if ifname != scope.last() {
                return Err(HandlerError::invalid(
                    scope,
                    format!("interface id does not match {ifname}"),
                ));
            }
        } else if config.one_of_change(&refs) && !config.compare(&["subinterface"]) {
            return Err(HandlerError::invalid(
                scope,
                "interface and subinterface must be set together",
            ));
        }
        Ok(())
    }

    fn protocol_static_routes(
        &mut self,
        scope: &Scope,
        protocol: &Protocol,
    ) -> Result<(), HandlerError> {
        if protocol.identifier == InstallProtocolType::Static {
            return Ok(());
        }
        Err(HandlerError::invalid(
            scope,
            format!("static routes need the STATIC protocol, not {}", protocol.identifier),
        ))
    }

    fn static_route_config(
        &mut self,
        scope: &Scope,
        config: &StaticRouteConfig,
    ) -> Result<(), HandlerError> {
        verify_address(scope, config, config.ip, config.prefix_length)
    }

    fn static_route_next_hop(
        &mut self,
        scope: &Scope,
        next_hop: &NextHopEntry,
    ) -> Result<(), HandlerError> {
        if !next_hop.get_change("config") {
            return Err(HandlerError::invalid(
                scope,
                "next-hop cannot be changed partially",
            ));
        }
        if next_hop.config.next_hop == Some(NextHop::LocalLink) {
            return Err(HandlerError::Unsupported {
                what: "next-hop",
                value: NextHop::LocalLink.to_string(),
            });
        }
        Ok(())
    }

    fn static_route_next_hop_config(
        &mut self,
        scope: &Scope,
        config: &NextHopConfig,
    ) -> Result<(), HandlerError> {
        if config.get_change("next-hop") {
            Ok(())
        } else {
            Err(HandlerError::invalid(scope, "next-hop not specified"))
        }
    }
}
