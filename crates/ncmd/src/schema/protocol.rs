//! Routing protocols of an instance and their static routes.

use std::fmt;
use std::net::IpAddr;

use ncm_tree::{
    Changes, Field, FieldsBuilder, KeyedList, ListEntry, Node, PathSegment, TreeError, ValueError,
    impl_tracked,
};
use once_cell::sync::Lazy;

use super::{InstallProtocolType, NetworkInstanceProcessor, NextHop};
use crate::handler::HandlerError;

/// Key of `protocols/protocol[identifier][name]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolKey {
    /// Protocol kind.
    pub identifier: InstallProtocolType,
    /// Protocol instance name.
    pub name: String,
}

impl fmt::Display for ProtocolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.identifier, self.name)
    }
}

/// `protocols/protocol[identifier][name]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Protocol {
    changes: Changes,
    /// Protocol kind.
    pub identifier: InstallProtocolType,
    /// Protocol instance name.
    pub name: String,
    /// Protocol settings.
    pub config: ProtocolConfig,
    /// Static routes, for the `STATIC` protocol.
    pub static_routes: KeyedList<StaticRoute>,
}

impl Protocol {
    /// The entry key.
    #[must_use]
    pub fn key(&self) -> ProtocolKey {
        ProtocolKey {
            identifier: self.identifier,
            name: self.name.clone(),
        }
    }
}

/// `protocol/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolConfig {
    changes: Changes,
    /// Protocol kind, repeated.
    pub identifier: InstallProtocolType,
    /// Protocol instance name, repeated.
    pub name: String,
}

/// Key of `static-routes/static[ip][prefix-length]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticRouteKey {
    /// Destination network address.
    pub ip: IpAddr,
    /// Destination prefix length.
    pub prefix_length: u8,
}

impl fmt::Display for StaticRouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_length)
    }
}

/// `static-routes/static[ip][prefix-length]`.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticRoute {
    changes: Changes,
    /// Destination network address.
    pub ip: IpAddr,
    /// Destination prefix length.
    pub prefix_length: u8,
    /// Route settings.
    pub config: StaticRouteConfig,
    /// Next hops by index.
    pub next_hops: KeyedList<NextHopEntry>,
}

impl StaticRoute {
    /// The entry key.
    #[must_use]
    pub const fn key(&self) -> StaticRouteKey {
        StaticRouteKey {
            ip: self.ip,
            prefix_length: self.prefix_length,
        }
    }
}

/// `static/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRouteConfig {
    changes: Changes,
    /// Destination network address, repeated.
    pub ip: Option<IpAddr>,
    /// Destination prefix length, repeated.
    pub prefix_length: u8,
}

/// `next-hops/next-hop[index]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NextHopEntry {
    changes: Changes,
    /// Next-hop index.
    pub index: String,
    /// Next-hop settings.
    pub config: NextHopConfig,
}

/// `next-hop/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NextHopConfig {
    changes: Changes,
    /// Next-hop index, repeated.
    pub index: String,
    /// Where matching traffic goes.
    pub next_hop: Option<NextHop>,
}

impl_tracked!(
    Protocol,
    ProtocolConfig,
    StaticRoute,
    StaticRouteConfig,
    NextHopEntry,
    NextHopConfig
);

fn parse_identifier(value: &str) -> Result<InstallProtocolType, ValueError> {
    InstallProtocolType::parse_identity(value)
}

static PROTOCOL_FIELDS: Lazy<Vec<Field<Protocol>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .key("identifier")
        .key("name")
        .trigger(&["identifier", "name"])
        .notify(|proto: &Protocol, p, scope| p.protocol(scope, proto))
        .node("config", |proto| &proto.config, |proto| &mut proto.config)
        .notify(|proto: &Protocol, p, scope| p.protocol_config(scope, &proto.config))
        .list(
            "static-routes",
            |proto| &proto.static_routes,
            |proto| &mut proto.static_routes,
        )
        .notify(|proto: &Protocol, p, scope| p.protocol_static_routes(scope, proto))
        .build()
});

static PROTOCOL_CONFIG_FIELDS: Lazy<Vec<Field<ProtocolConfig>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .leaf("identifier", |c: &mut ProtocolConfig, v| {
            c.identifier = parse_identifier(v)?;
            Ok(())
        })
        .leaf("name", |c, v| {
            c.name = v.to_owned();
            Ok(())
        })
        .build()
});

static STATIC_ROUTE_FIELDS: Lazy<Vec<Field<StaticRoute>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .key("ip")
        .key("prefix-length")
        .trigger(&["ip", "prefix-length"])
        .notify(|route: &StaticRoute, p, scope| p.static_route(scope, route))
        .node("config", |route| &route.config, |route| &mut route.config)
        .notify(|route: &StaticRoute, p, scope| p.static_route_config(scope, &route.config))
        .list(
            "next-hops",
            |route| &route.next_hops,
            |route| &mut route.next_hops,
        )
        .build()
});

static STATIC_ROUTE_CONFIG_FIELDS: Lazy<Vec<Field<StaticRouteConfig>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .leaf("ip", |c: &mut StaticRouteConfig, v| {
            c.ip = Some(v.parse()?);
            Ok(())
        })
        .leaf("prefix-length", |c, v| {
            c.prefix_length = v.parse()?;
            Ok(())
        })
        .build()
});

static NEXT_HOP_FIELDS: Lazy<Vec<Field<NextHopEntry>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .key("index")
        .notify(|nh: &NextHopEntry, p, scope| p.static_route_next_hop(scope, nh))
        .node("config", |nh| &nh.config, |nh| &mut nh.config)
        .notify(|nh: &NextHopEntry, p, scope| p.static_route_next_hop_config(scope, &nh.config))
        .build()
});

static NEXT_HOP_CONFIG_FIELDS: Lazy<Vec<Field<NextHopConfig>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .leaf("index", |c: &mut NextHopConfig, v| {
            c.index = v.to_owned();
            Ok(())
        })
        .leaf("next-hop", |c, v| {
            c.next_hop = Some(v.parse()?);
            Ok(())
        })
        .build()
});

impl Node for Protocol {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &PROTOCOL_FIELDS
    }
}

impl ListEntry for Protocol {
    type Key = ProtocolKey;

    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError> {
        let raw = segment.require_attr("protocol", "identifier")?;
        let identifier = parse_identifier(raw)
            .map_err(|error| TreeError::parse("identifier", raw, &error))?;
        let name = segment.require_attr("protocol", "name")?;
        Ok(ProtocolKey {
            identifier,
            name: name.to_owned(),
        })
    }

    fn with_key(key: &Self::Key) -> Self {
        Self {
            identifier: key.identifier,
            name: key.name.clone(),
            ..Self::default()
        }
    }
}

impl Node for ProtocolConfig {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &PROTOCOL_CONFIG_FIELDS
    }
}

impl Node for StaticRoute {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &STATIC_ROUTE_FIELDS
    }
}

impl ListEntry for StaticRoute {
    type Key = StaticRouteKey;

    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError> {
        let ip_raw = segment.require_attr("static", "ip")?;
        let ip = ip_raw
            .parse()
            .map_err(|error| TreeError::parse("ip", ip_raw, &ValueError::from(error)))?;
        let plen_raw = segment.require_attr("static", "prefix-length")?;
        let prefix_length = plen_raw
            .parse()
            .map_err(|error| TreeError::parse("prefix-length", plen_raw, &ValueError::from(error)))?;
        Ok(StaticRouteKey { ip, prefix_length })
    }

    fn with_key(key: &Self::Key) -> Self {
        Self {
            changes: Changes::new(),
            ip: key.ip,
            prefix_length: key.prefix_length,
            config: StaticRouteConfig::default(),
            next_hops: KeyedList::new(),
        }
    }
}

impl Node for StaticRouteConfig {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &STATIC_ROUTE_CONFIG_FIELDS
    }
}

impl Node for NextHopEntry {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &NEXT_HOP_FIELDS
    }
}

impl ListEntry for NextHopEntry {
    type Key = String;

    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError> {
        segment.require_attr("next-hop", "index").map(str::to_owned)
    }

    fn with_key(key: &Self::Key) -> Self {
        Self {
            index: key.clone(),
            ..Self::default()
        }
    }
}

impl Node for NextHopConfig {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &NEXT_HOP_CONFIG_FIELDS
    }
}

impl fmt::Display for StaticRouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ip = self.ip.map_or_else(String::new, |ip| ip.to_string());
        write!(
            f,
            "config{{ip={ip}, prefix-length={}}} {{{}}}",
            self.prefix_length, self.changes
        )
    }
}
