//! # Primary Address Selection
//!
//! Picks the canonical IPv4 / IPv6 address of a multi-homed host or VM and writes it back,
//! along with the primary MAC of interfaces.
//!
//! Selection walks the candidates in order and replaces the current pick whenever there is
//! none yet or the candidate is preferred. With no preferred candidate the first one wins;
//! with several, the last preferred one wins.

use std::net::IpAddr;
use std::sync::Arc;

use ssot_common::Result;
use ssot_common::model::{
    AssignedObject, Device, Interface, InventoryObject, IpAddress, MacAddress, Meta, ObjectId, Vm,
    VmInterface,
};
use ssot_common::network::{parse_interface_address, subnet_contains};

use crate::inventory::{HasRegistry, Inventory};

/// Anything that carries an interface address such as `10.0.1.5/24`.
pub trait CandidateAddress {
    fn address(&self) -> &str;

    /// Whether this address's subnet contains `gateway`.
    fn contains_gateway(&self, gateway: &str) -> bool {
        subnet_contains(self.address(), gateway)
    }

    /// Whether the host part of this address equals `ip`.
    fn is_host(&self, ip: IpAddr) -> bool {
        parse_interface_address(self.address()).is_ok_and(|net| net.ip() == ip)
    }
}

impl CandidateAddress for IpAddress {
    fn address(&self) -> &str {
        &self.address
    }
}

impl<T: CandidateAddress> CandidateAddress for Arc<T> {
    fn address(&self) -> &str {
        self.as_ref().address()
    }
}

impl CandidateAddress for String {
    fn address(&self) -> &str {
        self
    }
}

impl CandidateAddress for &str {
    fn address(&self) -> &str {
        self
    }
}

/// The selection loop: `best` is replaced when unset or when `prefer` holds.
pub fn select_by<'a, T>(candidates: &'a [T], prefer: impl Fn(&T) -> bool) -> Option<&'a T> {
    let mut best = None;
    for candidate in candidates {
        if best.is_none() || prefer(candidate) {
            best = Some(candidate);
        }
    }
    best
}

/// Primary address of a VM: the (last) candidate whose subnet holds the default gateway.
pub fn select_primary<'a, T: CandidateAddress>(
    candidates: &'a [T],
    gateway: Option<&str>,
) -> Option<&'a T> {
    select_by(candidates, |c| gateway.is_some_and(|gw| c.contains_gateway(gw)))
}

/// Primary address of a host: the (last) candidate equal to what the host name resolves to.
pub fn select_host_primary<'a, T: CandidateAddress>(
    candidates: &'a [T],
    resolved: Option<IpAddr>,
) -> Option<&'a T> {
    select_by(candidates, |c| resolved.is_some_and(|ip| c.is_host(ip)))
}

/// Objects that own IP addresses and carry primary-address fields.
pub trait PrimaryIps: InventoryObject {
    fn primary_ips_mut(&mut self) -> (&mut Option<ObjectId>, &mut Option<ObjectId>);
}

impl PrimaryIps for Device {
    fn primary_ips_mut(&mut self) -> (&mut Option<ObjectId>, &mut Option<ObjectId>) {
        (&mut self.primary_ipv4, &mut self.primary_ipv6)
    }
}

impl PrimaryIps for Vm {
    fn primary_ips_mut(&mut self) -> (&mut Option<ObjectId>, &mut Option<ObjectId>) {
        (&mut self.primary_ipv4, &mut self.primary_ipv6)
    }
}

/// Interfaces that own MAC addresses.
#[derive(Debug, Clone)]
pub enum MacOwner {
    Interface(Arc<Interface>),
    VmInterface(Arc<VmInterface>),
}

impl MacOwner {
    pub fn assigned(&self) -> AssignedObject {
        match self {
            MacOwner::Interface(iface) => iface.assigned(),
            MacOwner::VmInterface(iface) => iface.assigned(),
        }
    }

    pub fn meta(&self) -> &Meta {
        match self {
            MacOwner::Interface(iface) => iface.meta(),
            MacOwner::VmInterface(iface) => iface.meta(),
        }
    }
}

/// Writes the chosen primary addresses onto a copy of `owner` and re-submits it.
/// Does nothing when neither family has a pick.
pub async fn set_primary_ips<T: PrimaryIps>(
    inventory: &Inventory,
    owner: &Arc<T>,
    ipv4: Option<&IpAddress>,
    ipv6: Option<&IpAddress>,
) -> Result<Arc<T>>
where
    Inventory: HasRegistry<T>,
{
    if ipv4.is_none() && ipv6.is_none() {
        return Ok(Arc::clone(owner));
    }

    let mut copy = T::clone(owner);
    let (primary4, primary6) = copy.primary_ips_mut();
    if let Some(ip) = ipv4 {
        *primary4 = Some(ip.id());
    }
    if let Some(ip) = ipv6 {
        *primary6 = Some(ip.id());
    }
    inventory.upsert(copy).await
}

/// Creates the MAC address object assigned to `owner`. `mac` must already be normalized.
pub async fn create_mac_address(
    inventory: &Inventory,
    owner: &MacOwner,
    mac: &str,
) -> Result<Arc<MacAddress>> {
    inventory
        .upsert(MacAddress {
            meta: Meta::tagged(owner.meta().tags.iter().cloned()),
            mac: mac.to_string(),
            assigned: Some(owner.assigned()),
        })
        .await
}

/// Re-submits a copy of `owner` with `mac` as its primary MAC.
pub async fn set_primary_mac(
    inventory: &Inventory,
    owner: &MacOwner,
    mac: &MacAddress,
) -> Result<MacOwner> {
    match owner {
        MacOwner::Interface(iface) => {
            let mut copy = Interface::clone(iface);
            copy.primary_mac = Some(mac.id());
            inventory.upsert(copy).await.map(MacOwner::Interface)
        }
        MacOwner::VmInterface(iface) => {
            let mut copy = VmInterface::clone(iface);
            copy.primary_mac = Some(mac.id());
            inventory.upsert(copy).await.map(MacOwner::VmInterface)
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
