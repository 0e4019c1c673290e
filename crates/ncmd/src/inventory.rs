//! Read-only snapshot of the device's interfaces.
//!
//! The snapshot is rebuilt from the datastore once per notification and
//! shared with every handler of that notification.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ncm_tree::{PathSegment, parse_path};
use thiserror::Error;

use crate::datastore::{Datastore, DatastoreError, Value};

const TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::inventory");

/// Subtree the inventory is built from.
pub const INVENTORY_FILTER: &str = "/openconfig-interfaces:interfaces";

/// An interface name split into device and sub-interface index.
///
/// `eth1.10` is sub-interface 10 of `eth1`; a bare `eth1` is index 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IfName {
    device: String,
    index: u32,
}

impl IfName {
    /// Joins a device and index.
    #[must_use]
    pub fn new(device: impl Into<String>, index: u32) -> Self {
        Self {
            device: device.into(),
            index,
        }
    }

    /// Parent device name.
    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Sub-interface index, 0 for the device itself.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }
}

impl FromStr for IfName {
    type Err = InventoryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let invalid = || InventoryError::InvalidName {
            name: name.to_owned(),
        };
        let (device, index) = match name.split_once('.') {
            Some((device, index)) => (device, index.parse().map_err(|_| invalid())?),
            None => (name, 0),
        };
        if device.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(device, index))
    }
}

impl fmt::Display for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            f.write_str(&self.device)
        } else {
            write!(f, "{}.{}", self.device, self.index)
        }
    }
}

/// Failures looking up interfaces.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The name is not `device` or `device.index`.
    #[error("invalid interface name {name:?}")]
    InvalidName {
        /// Name as given.
        name: String,
    },

    /// The device is not known.
    #[error("interface {name} not found")]
    UnknownInterface {
        /// Device name.
        name: String,
    },

    /// The device has no such sub-interface.
    #[error("subinterface {name} not found")]
    UnknownSubinterface {
        /// Full interface name.
        name: String,
    },

    /// The snapshot could not be read.
    #[error("failed to refresh inventory: {0}")]
    Refresh(#[from] DatastoreError),
}

/// One sub-interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subinterface {
    /// Index below the parent device.
    pub index: u32,
    /// IPv4 MTU, when configured.
    pub mtu: Option<u32>,
    /// IPv4 addresses and their prefix lengths.
    pub addresses: BTreeMap<IpAddr, u8>,
}

/// One device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    /// Device name.
    pub name: String,
    /// Sub-interfaces by index.
    pub subinterfaces: BTreeMap<u32, Subinterface>,
}

/// Interfaces by device name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    interfaces: BTreeMap<String, Interface>,
}

impl Inventory {
    /// Reads the interface subtree from `datastore`.
    pub fn load(datastore: &dyn Datastore) -> Result<Self, InventoryError> {
        let items = datastore.get_items(INVENTORY_FILTER)?;
        let inventory = Self::from_values(&items);
        tracing::debug!(
            target: TARGET,
            interfaces = inventory.interfaces.len(),
            "inventory refreshed"
        );
        Ok(inventory)
    }

    /// Builds a snapshot from interface-subtree values. Values the snapshot
    /// does not model are skipped.
    #[must_use]
    pub fn from_values(items: &[Value]) -> Self {
        let mut inventory = Self::default();
        for item in items {
            match parse_path(&item.path) {
                Ok(segments) => inventory.absorb(&segments, &item.payload),
                Err(error) => {
                    tracing::debug!(target: TARGET, path = %item.path, %error, "skipping value");
                }
            }
        }
        inventory
    }

    fn absorb(&mut self, segments: &[PathSegment], payload: &str) {
        let [_, interface, rest @ ..] = segments else {
            return;
        };
        let Some(name) = interface.attr("name") else {
            return;
        };
        let entry = self
            .interfaces
            .entry(name.to_owned())
            .or_insert_with(|| Interface {
                name: name.to_owned(),
                ..Interface::default()
            });

        let [container, subif, rest @ ..] = rest else {
            return;
        };
        if container.name() != "subinterfaces" {
            return;
        }
        let Some(index) = subif.attr("index").and_then(|i| i.parse::<u32>().ok()) else {
            return;
        };
        let sub = entry.subinterfaces.entry(index).or_insert_with(|| Subinterface {
            index,
            ..Subinterface::default()
        });

        let names: Vec<&str> = rest.iter().map(PathSegment::name).collect();
        match names.as_slice() {
            ["ipv4", "config", "mtu"] => sub.mtu = payload.parse().ok(),
            ["ipv4", "addresses", "address", "config", "prefix-length"] => {
                let ip = rest
                    .get(2)
                    .and_then(|address| address.attr("ip"))
                    .and_then(|ip| ip.parse().ok());
                if let (Some(ip), Ok(plen)) = (ip, payload.parse()) {
                    sub.addresses.insert(ip, plen);
                }
            }
            _ => {}
        }
    }

    /// Device `name`.
    pub fn interface(&self, name: &str) -> Result<&Interface, InventoryError> {
        self.interfaces
            .get(name)
            .ok_or_else(|| InventoryError::UnknownInterface {
                name: name.to_owned(),
            })
    }

    /// Sub-interface addressed by `id`, with its parsed name.
    pub fn subinterface(&self, id: &str) -> Result<(IfName, &Subinterface), InventoryError> {
        let ifname: IfName = id.parse()?;
        let subif = self
            .interface(ifname.device())?
            .subinterfaces
            .get(&ifname.index())
            .ok_or_else(|| InventoryError::UnknownSubinterface { name: id.to_owned() })?;
        Ok((ifname, subif))
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Whether no device is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
