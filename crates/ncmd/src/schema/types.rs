//! Leaf value types of the network-instance schema.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use ncm_tree::ValueError;
use strum::{Display, EnumString};

/// Drops a YANG identity prefix such as `oc-ni-types:`.
fn identity(value: &str) -> &str {
    value.rsplit_once(':').map_or(value, |(_, local)| local)
}

/// Kind of network instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString)]
pub enum NetworkInstanceType {
    /// The global routing table.
    #[default]
    #[strum(serialize = "DEFAULT_INSTANCE")]
    DefaultInstance,
    /// A layer-3 VRF.
    #[strum(serialize = "L3VRF")]
    L3Vrf,
    /// A layer-2 virtual switch.
    #[strum(serialize = "L2VSI")]
    L2Vsi,
    /// A layer-2 point-to-point service.
    #[strum(serialize = "L2P2P")]
    L2P2p,
    /// A combined layer-2/layer-3 instance.
    #[strum(serialize = "L2L3")]
    L2L3,
}

impl NetworkInstanceType {
    /// Parses a possibly prefixed identity.
    pub fn parse_identity(value: &str) -> Result<Self, ValueError> {
        Ok(identity(value).parse()?)
    }
}

/// Protocol that installed a route, used as the first protocol key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallProtocolType {
    /// Static routes.
    #[default]
    Static,
    /// BGP.
    Bgp,
    /// OSPF.
    Ospf,
    /// Connected routes.
    DirectlyConnected,
    /// Locally generated aggregates.
    LocalAggregate,
}

impl InstallProtocolType {
    /// Parses a possibly prefixed identity.
    pub fn parse_identity(value: &str) -> Result<Self, ValueError> {
        Ok(identity(value).parse()?)
    }
}

/// A route distinguisher or route target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RouteDistinguisher {
    /// Not configured.
    #[default]
    None,
    /// `asn2:number`.
    Type0 {
        /// Two-byte AS number.
        admin: u16,
        /// Assigned number.
        number: u32,
    },
    /// `ipv4:number`.
    Type1 {
        /// IPv4 address.
        admin: Ipv4Addr,
        /// Assigned number.
        number: u16,
    },
    /// `asn4:number`.
    Type2 {
        /// Four-byte AS number.
        admin: u32,
        /// Assigned number.
        number: u16,
    },
}

impl RouteDistinguisher {
    /// Whether a value is configured.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl FromStr for RouteDistinguisher {
    type Err = ValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Ok(Self::None);
        }
        let invalid = || ValueError::new(format!("invalid RD/RT {value:?}"));
        let (admin, number) = value.split_once(':').ok_or_else(invalid)?;
        if admin.is_empty() || number.is_empty() || number.contains(':') {
            return Err(invalid());
        }

        if let (Ok(asn), Ok(assigned)) = (admin.parse(), number.parse()) {
            return Ok(Self::Type0 {
                admin: asn,
                number: assigned,
            });
        }
        if let (Ok(asn), Ok(assigned)) = (admin.parse(), number.parse()) {
            return Ok(Self::Type1 {
                admin: asn,
                number: assigned,
            });
        }
        if let (Ok(asn), Ok(assigned)) = (admin.parse(), number.parse()) {
            return Ok(Self::Type2 {
                admin: asn,
                number: assigned,
            });
        }
        Err(invalid())
    }
}

impl fmt::Display for RouteDistinguisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Type0 { admin, number } => write!(f, "{admin}:{number}"),
            Self::Type1 { admin, number } => write!(f, "{admin}:{number}"),
            Self::Type2 { admin, number } => write!(f, "{admin}:{number}"),
        }
    }
}

/// Next hop of a static route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NextHop {
    /// Forward to an address.
    Ip(IpAddr),
    /// Discard matching traffic.
    Drop,
    /// Forward out of a directly attached interface.
    LocalLink,
}

impl FromStr for NextHop {
    type Err = ValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Ok(ip) = value.parse() {
            return Ok(Self::Ip(ip));
        }
        match identity(value) {
            "DROP" => Ok(Self::Drop),
            "LOCAL_LINK" => Ok(Self::LocalLink),
            _ => Err(ValueError::new(format!("invalid next-hop {value:?}"))),
        }
    }
}

impl fmt::Display for NextHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Drop => f.write_str("DROP"),
            Self::LocalLink => f.write_str("LOCAL_LINK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv6Addr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", RouteDistinguisher::None)]
    #[case("65000:100", RouteDistinguisher::Type0 { admin: 65000, number: 100 })]
    #[case(
        "10.0.0.1:7",
        RouteDistinguisher::Type1 { admin: Ipv4Addr::new(10, 0, 0, 1), number: 7 }
    )]
    #[case("4200000000:7", RouteDistinguisher::Type2 { admin: 4_200_000_000, number: 7 })]
    fn route_distinguishers_pick_the_first_matching_type(
        #[case] raw: &str,
        #[case] expected: RouteDistinguisher,
    ) {
        let parsed: RouteDistinguisher = raw.parse().expect("valid RD");
        assert_eq!(parsed, expected);
        assert_eq!(parsed.to_string(), raw);
    }

    #[rstest]
    #[case("65000")]
    #[case(":100")]
    #[case("a:b")]
    #[case("1:2:3")]
    #[case("4200000000:70000")]
    fn malformed_route_distinguishers_fail(#[case] raw: &str) {
        assert!(raw.parse::<RouteDistinguisher>().is_err());
    }

    #[rstest]
    #[case("L3VRF", NetworkInstanceType::L3Vrf)]
    #[case("oc-ni-types:DEFAULT_INSTANCE", NetworkInstanceType::DefaultInstance)]
    fn instance_types_accept_prefixed_identities(
        #[case] raw: &str,
        #[case] expected: NetworkInstanceType,
    ) {
        assert_eq!(NetworkInstanceType::parse_identity(raw), Ok(expected));
    }

    #[test]
    fn protocol_identities_use_upper_snake_case() {
        assert_eq!(
            InstallProtocolType::parse_identity("oc-pol-types:DIRECTLY_CONNECTED"),
            Ok(InstallProtocolType::DirectlyConnected)
        );
        assert_eq!(InstallProtocolType::Static.to_string(), "STATIC");
    }

    #[rstest]
    #[case("192.168.0.1", NextHop::Ip(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1))))]
    #[case("2001:db8::1", NextHop::Ip(IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1))))]
    #[case("oc-loc-rt:DROP", NextHop::Drop)]
    #[case("LOCAL_LINK", NextHop::LocalLink)]
    fn next_hops_parse_addresses_before_identities(#[case] raw: &str, #[case] expected: NextHop) {
        assert_eq!(raw.parse(), Ok(expected));
    }
}
