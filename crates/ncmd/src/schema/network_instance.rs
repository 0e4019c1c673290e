//! The top-level network-instance entry and its config container.

use std::fmt;
use std::net::Ipv4Addr;

use ncm_tree::{
    Changes, Field, FieldsBuilder, KeyedList, ListEntry, Node, PathSegment, TreeError,
    impl_tracked,
};
use once_cell::sync::Lazy;

use super::{
    Interface, Loopback, NetworkInstanceProcessor, NetworkInstanceType, Protocol,
    RouteDistinguisher,
};
use crate::handler::HandlerError;

/// One network instance, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInstance {
    changes: Changes,
    /// Instance name.
    pub name: String,
    /// Instance-wide settings.
    pub config: Config,
    /// Loopback interfaces.
    pub loopbacks: KeyedList<Loopback>,
    /// Attached interfaces.
    pub interfaces: KeyedList<Interface>,
    /// Routing protocols.
    pub protocols: KeyedList<Protocol>,
}

/// Instance-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    changes: Changes,
    /// Instance name, repeated.
    pub name: String,
    /// Instance kind.
    pub kind: NetworkInstanceType,
    /// Free-form description.
    pub description: String,
    /// Router identifier.
    pub router_id: Option<Ipv4Addr>,
    /// VRF route distinguisher.
    pub route_distinguisher: RouteDistinguisher,
    /// VRF route target.
    pub route_target: RouteDistinguisher,
}

impl_tracked!(NetworkInstance, Config);

static NETWORK_INSTANCE_FIELDS: Lazy<Vec<Field<NetworkInstance>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .key("name")
        .notify(|ni: &NetworkInstance, p, scope| p.network_instance(scope, ni))
        .node("config", |ni| &ni.config, |ni| &mut ni.config)
        .notify(|ni: &NetworkInstance, p, scope| p.config(scope, &ni.config))
        .list("loopbacks", |ni| &ni.loopbacks, |ni| &mut ni.loopbacks)
        .list("interfaces", |ni| &ni.interfaces, |ni| &mut ni.interfaces)
        .list("protocols", |ni| &ni.protocols, |ni| &mut ni.protocols)
        .build()
});

static CONFIG_FIELDS: Lazy<Vec<Field<Config>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .leaf("name", |c: &mut Config, v| {
            c.name = v.to_owned();
            Ok(())
        })
        .leaf("type", |c, v| {
            c.kind = NetworkInstanceType::parse_identity(v)?;
            Ok(())
        })
        .leaf("description", |c, v| {
            c.description = v.to_owned();
            Ok(())
        })
        .leaf("router-id", |c, v| {
            c.router_id = Some(v.parse()?);
            Ok(())
        })
        .leaf("route-distinguisher", |c, v| {
            c.route_distinguisher = v.parse()?;
            Ok(())
        })
        .leaf("route-target", |c, v| {
            c.route_target = v.parse()?;
            Ok(())
        })
        .build()
});

impl Node for NetworkInstance {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &NETWORK_INSTANCE_FIELDS
    }
}

impl ListEntry for NetworkInstance {
    type Key = String;

    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError> {
        segment
            .require_attr("network-instance", "name")
            .map(str::to_owned)
    }

    fn with_key(key: &Self::Key) -> Self {
        Self {
            name: key.clone(),
            ..Self::default()
        }
    }
}

impl Node for Config {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &CONFIG_FIELDS
    }
}

impl fmt::Display for NetworkInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "network-instance[{}] {{{}}} loopbacks={} interfaces={} protocols={}",
            self.name,
            self.changes,
            self.loopbacks.len(),
            self.interfaces.len(),
            self.protocols.len()
        )
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "config{{name={:?}, type={}, router-id={}, rd={:?}, rt={:?}}} {{{}}}",
            self.name,
            self.kind,
            self.router_id.map_or_else(String::new, |id| id.to_string()),
            self.route_distinguisher.to_string(),
            self.route_target.to_string(),
            self.changes
        )
    }
}
