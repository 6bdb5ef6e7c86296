use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use pnet::ipnetwork::{self, IpNetwork};
use serde::Deserialize;

use crate::error::{Result, SsotError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }

    /// Prefix length of a single-host network in this family.
    pub fn host_prefix(&self) -> u8 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }
}

/// Parses an interface address such as `10.0.1.5/24`. Host bits may be set; a bare address
/// is treated as a host route.
pub fn parse_interface_address(address: &str) -> Result<IpNetwork> {
    let trimmed = address.trim();
    IpNetwork::from_str(trimmed)
        .map_err(|e| SsotError::invalid_record(format!("address '{trimmed}': {e}")))
}

/// Whether the subnet of `address` contains `gateway`. Unparsable input never matches.
pub fn subnet_contains(address: &str, gateway: &str) -> bool {
    let Ok(network) = parse_interface_address(address) else {
        return false;
    };
    match IpAddr::from_str(gateway.trim()) {
        Ok(gateway) => network.contains(gateway),
        Err(_) => false,
    }
}

/// Network prefix of an interface address, e.g. `10.0.1.5/24` -> (`10.0.1.0/24`, 24).
pub fn prefix_of(address: &str) -> Result<(String, u8)> {
    let network = parse_interface_address(address)?;
    let prefix = network.prefix();
    let base = IpNetwork::new(network.network(), prefix)
        .map_err(|e| SsotError::invalid_record(format!("prefix of '{address}': {e}")))?;
    Ok((base.to_string(), prefix))
}

/// Converts a dotted IPv4 netmask to a prefix length.
pub fn mask_to_bits(mask: &str) -> Result<u8> {
    let mask = Ipv4Addr::from_str(mask.trim())
        .map_err(|e| SsotError::invalid_record(format!("netmask '{mask}': {e}")))?;
    ipnetwork::ipv4_mask_to_prefix(mask)
        .map_err(|e| SsotError::invalid_record(format!("netmask '{mask}': {e}")))
}

/// A list of subnets from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct SubnetList(Vec<IpNetwork>);

impl SubnetList {
    pub fn new(networks: Vec<IpNetwork>) -> Self {
        Self(networks)
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        self.0.iter().any(|net| net.contains(addr))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpNetwork> {
        self.0.iter()
    }
}

impl TryFrom<Vec<String>> for SubnetList {
    type Error = SsotError;

    fn try_from(entries: Vec<String>) -> Result<Self> {
        entries
            .iter()
            .map(|entry| {
                IpNetwork::from_str(entry.trim())
                    .map_err(|e| SsotError::Config(format!("subnet '{entry}': {e}")))
            })
            .collect::<Result<Vec<_>>>()
            .map(SubnetList)
    }
}

/// Admission check for a discovered address (with or without prefix length).
///
/// Ignored subnets always win. An empty permitted list admits everything else.
pub fn is_permitted(address: &str, permitted: &SubnetList, ignored: &SubnetList) -> bool {
    let Ok(network) = parse_interface_address(address) else {
        return false;
    };
    let ip = network.ip();
    if ignored.contains(ip) {
        return false;
    }
    permitted.is_empty() || permitted.contains(ip)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
