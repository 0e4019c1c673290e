//! Loopback interfaces of an instance.

use std::fmt;
use std::net::IpAddr;

use ncm_tree::{
    Changes, Field, FieldsBuilder, KeyedList, ListEntry, Node, PathSegment, TreeError,
    impl_tracked,
};
use once_cell::sync::Lazy;

use super::NetworkInstanceProcessor;
use crate::handler::HandlerError;

/// `loopbacks/loopback[id]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loopback {
    changes: Changes,
    /// Loopback name.
    pub id: String,
    /// Loopback settings.
    pub config: LoopbackConfig,
    /// Addresses by index.
    pub addresses: KeyedList<Address>,
}

/// `loopback/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopbackConfig {
    changes: Changes,
    /// Loopback name, repeated.
    pub id: String,
}

/// `addresses/address[index]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    changes: Changes,
    /// Address index.
    pub index: String,
    /// Address settings.
    pub config: AddressConfig,
}

/// `address/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressConfig {
    changes: Changes,
    /// Address index, repeated.
    pub index: String,
    /// Interface address.
    pub ip: Option<IpAddr>,
    /// Prefix length of `ip`.
    pub prefix_length: u8,
}

impl AddressConfig {
    /// `ip/prefix-length`, when the address is set.
    #[must_use]
    pub fn cidr(&self) -> Option<String> {
        self.ip.map(|ip| format!("{ip}/{}", self.prefix_length))
    }
}

impl_tracked!(Loopback, LoopbackConfig, Address, AddressConfig);

static LOOPBACK_FIELDS: Lazy<Vec<Field<Loopback>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .key("id")
        .notify(|lo: &Loopback, p, scope| p.loopback(scope, lo))
        .node("config", |lo| &lo.config, |lo| &mut lo.config)
        .notify(|lo: &Loopback, p, scope| p.loopback_config(scope, &lo.config))
        .list("addresses", |lo| &lo.addresses, |lo| &mut lo.addresses)
        .build()
});

static LOOPBACK_CONFIG_FIELDS: Lazy<Vec<Field<LoopbackConfig>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .leaf("id", |c: &mut LoopbackConfig, v| {
            c.id = v.to_owned();
            Ok(())
        })
        .build()
});

static ADDRESS_FIELDS: Lazy<Vec<Field<Address>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .key("index")
        .notify(|addr: &Address, p, scope| p.loopback_address(scope, addr))
        .node("config", |addr| &addr.config, |addr| &mut addr.config)
        .notify(|addr: &Address, p, scope| p.loopback_address_config(scope, &addr.config))
        .build()
});

static ADDRESS_CONFIG_FIELDS: Lazy<Vec<Field<AddressConfig>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .leaf("index", |c: &mut AddressConfig, v| {
            c.index = v.to_owned();
            Ok(())
        })
        .leaf("ip", |c, v| {
            c.ip = Some(v.parse()?);
            Ok(())
        })
        .leaf("prefix-length", |c, v| {
            c.prefix_length = v.parse()?;
            Ok(())
        })
        .build()
});

impl Node for Loopback {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &LOOPBACK_FIELDS
    }
}

impl ListEntry for Loopback {
    type Key = String;

    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError> {
        segment.require_attr("loopback", "id").map(str::to_owned)
    }

    fn with_key(key: &Self::Key) -> Self {
        Self {
            id: key.clone(),
            ..Self::default()
        }
    }
}

impl Node for LoopbackConfig {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &LOOPBACK_CONFIG_FIELDS
    }
}

impl Node for Address {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &ADDRESS_FIELDS
    }
}

impl ListEntry for Address {
    type Key = String;

    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError> {
        segment.require_attr("address", "index").map(str::to_owned)
    }

    fn with_key(key: &Self::Key) -> Self {
        Self {
            index: key.clone(),
            ..Self::default()
        }
    }
}

impl Node for AddressConfig {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &ADDRESS_CONFIG_FIELDS
    }
}

impl fmt::Display for AddressConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "config{{index={:?}, address={}}} {{{}}}",
            self.index,
            self.cidr().unwrap_or_default(),
            self.changes
        )
    }
}
