//! Interfaces attached to an instance.

use std::fmt;

use ncm_tree::{
    Changes, Field, FieldsBuilder, ListEntry, Node, PathSegment, TreeError, impl_tracked,
};
use once_cell::sync::Lazy;

use super::NetworkInstanceProcessor;
use crate::handler::HandlerError;
use crate::inventory::IfName;

/// `interfaces/interface[id]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    changes: Changes,
    /// Interface name, such as `eth1.10`.
    pub id: String,
    /// Attachment settings.
    pub config: InterfaceConfig,
}

/// `interface/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceConfig {
    changes: Changes,
    /// Interface name, repeated.
    pub id: String,
    /// Referenced device.
    pub interface: String,
    /// Referenced sub-interface index.
    pub subinterface: u32,
}

impl InterfaceConfig {
    /// Name formed from `interface` and `subinterface`.
    #[must_use]
    pub fn ifname(&self) -> IfName {
        IfName::new(self.interface.clone(), self.subinterface)
    }
}

impl_tracked!(Interface, InterfaceConfig);

static INTERFACE_FIELDS: Lazy<Vec<Field<Interface>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .key("id")
        .notify(|iface: &Interface, p, scope| p.interface(scope, iface))
        .node("config", |iface| &iface.config, |iface| &mut iface.config)
        .notify(|iface: &Interface, p, scope| p.interface_config(scope, &iface.config))
        .build()
});

static INTERFACE_CONFIG_FIELDS: Lazy<Vec<Field<InterfaceConfig>>> = Lazy::new(|| {
    FieldsBuilder::new()
        .leaf("id", |c: &mut InterfaceConfig, v| {
            c.id = v.to_owned();
            Ok(())
        })
        .leaf("interface", |c, v| {
            c.interface = v.to_owned();
            Ok(())
        })
        .leaf("subinterface", |c, v| {
            c.subinterface = v.parse()?;
            Ok(())
        })
        .build()
});

impl Node for Interface {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &INTERFACE_FIELDS
    }
}

impl ListEntry for Interface {
    type Key = String;

    fn key_from(segment: &PathSegment) -> Result<Self::Key, TreeError> {
        segment.require_attr("interface", "id").map(str::to_owned)
    }

    fn with_key(key: &Self::Key) -> Self {
        Self {
            id: key.clone(),
            ..Self::default()
        }
    }
}

impl Node for InterfaceConfig {
    type Processor = dyn NetworkInstanceProcessor;
    type Error = HandlerError;

    fn fields() -> &'static [Field<Self>] {
        &INTERFACE_CONFIG_FIELDS
    }
}

impl fmt::Display for InterfaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "config{{id={:?}, interface={:?}, subinterface={}}} {{{}}}",
            self.id, self.interface, self.subinterface, self.changes
        )
    }
}
