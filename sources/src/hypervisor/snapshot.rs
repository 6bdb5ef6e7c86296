//! Records of a hypervisor snapshot, keyed by source-native IDs.

use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Deserialize;
use ssot_common::network::{IpVersion, parse_interface_address};

/// Identifier types the host hardware reports its serial number under.
const SERIAL_IDENTIFIERS: [&str; 3] = ["EnclosureSerialNumberTag", "ServiceTag", "SerialNumberTag"];

const NO_ASSET_TAG: &str = "No Asset Tag";

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct HypervisorSnapshot {
    /// Object ID -> tags attached to it.
    pub tags: BTreeMap<String, Vec<TagRecord>>,
    pub networks: NetworkRecords,
    pub datacenters: BTreeMap<String, DatacenterRecord>,
    pub clusters: BTreeMap<String, ClusterRecord>,
    pub hosts: BTreeMap<String, HostRecord>,
    pub vms: BTreeMap<String, VmRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkRecords {
    /// Distributed port groups by key.
    pub portgroups: BTreeMap<String, PortgroupRecord>,
    /// Host name -> standard port groups by name.
    pub host_portgroups: BTreeMap<String, BTreeMap<String, HostPortgroupRecord>>,
    /// Host name -> virtual and proxy switches by name or UUID.
    pub host_switches: BTreeMap<String, BTreeMap<String, SwitchRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortgroupRecord {
    pub name: String,
    #[serde(default)]
    pub vlan_ids: Vec<u16>,
    #[serde(default)]
    pub vlan_id_ranges: Vec<String>,
    #[serde(default)]
    pub private: bool,
}

impl PortgroupRecord {
    /// The single VLAN this port group carries, if it carries exactly one real one.
    pub fn single_vid(&self) -> Option<u16> {
        match self.vlan_ids.as_slice() {
            [vid] if *vid != 0 && self.vlan_id_ranges.is_empty() => Some(*vid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostPortgroupRecord {
    #[serde(default)]
    pub vlan_id: u16,
    #[serde(default)]
    pub vswitch: String,
    /// Physical NICs backing the port group.
    #[serde(default)]
    pub nics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchRecord {
    pub name: String,
    #[serde(default)]
    pub mtu: u32,
    /// Keys of the physical NICs uplinked to this switch.
    #[serde(default)]
    pub pnics: Vec<String>,
    /// Proxy (distributed) switches trunk every VLAN.
    #[serde(default)]
    pub proxy: bool,
}

impl NetworkRecords {
    /// VID -> name of the distributed port group carrying only that VLAN.
    pub fn vid_names(&self) -> BTreeMap<u16, String> {
        self.portgroups
            .values()
            .filter_map(|pg| pg.single_vid().map(|vid| (vid, pg.name.clone())))
            .collect()
    }

    pub fn host_portgroup(&self, host: &str, portgroup: &str) -> Option<&HostPortgroupRecord> {
        self.host_portgroups.get(host)?.get(portgroup)
    }

    pub fn host_switch(&self, host: &str, switch: &str) -> Option<&SwitchRecord> {
        self.host_switches.get(host)?.get(switch)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatacenterRecord {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterRecord {
    pub name: String,
    #[serde(default)]
    pub datacenter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentifierRecord {
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostRecord {
    pub name: String,
    /// Cluster ID; standalone hosts have none.
    pub cluster: Option<String>,
    pub uuid: String,
    pub vendor: String,
    pub model: String,
    pub identifiers: Vec<IdentifierRecord>,
    pub connection_state: String,
    pub product_name: String,
    pub product_version: String,
    pub cpu_cores: u32,
    pub memory_bytes: u64,
    /// What the host name resolves to.
    pub address: Option<IpAddr>,
    pub pnics: Vec<PnicRecord>,
    pub vnics: Vec<VnicRecord>,
}

impl HostRecord {
    pub fn serial_number(&self) -> Option<&str> {
        self.identifiers
            .iter()
            .filter(|id| SERIAL_IDENTIFIERS.contains(&id.kind.as_str()))
            .map(|id| id.value.trim())
            .find(|value| !value.is_empty())
    }

    pub fn asset_tag(&self) -> Option<&str> {
        self.identifiers
            .iter()
            .filter(|id| id.kind == "AssetTag")
            .map(|id| id.value.trim())
            .find(|value| !value.is_empty() && *value != NO_ASSET_TAG)
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state == "connected"
    }

    pub fn memory_gb(&self) -> u64 {
        self.memory_bytes / (1024 * 1024 * 1024)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PnicRecord {
    pub device: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub speed_mb: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VnicRecord {
    pub device: String,
    /// Standard port group name, empty for distributed ports.
    #[serde(default)]
    pub portgroup: String,
    #[serde(default)]
    pub dv_portgroup: Option<String>,
    #[serde(default)]
    pub dv_switch: Option<String>,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub mtu: u32,
    #[serde(default)]
    pub ipv4: Option<String>,
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub ipv6: Vec<Ipv6Record>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ipv6Record {
    pub address: String,
    pub prefix_length: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VmRecord {
    pub name: String,
    /// Host ID.
    pub host: String,
    pub template: bool,
    pub powered_on: bool,
    pub guest_os: String,
    pub vcpus: u32,
    pub memory_mb: u64,
    /// Custom attribute name -> value.
    pub custom_fields: BTreeMap<String, String>,
    pub nics: Vec<VmNicRecord>,
    pub disks: Vec<DiskRecord>,
    pub routes: Vec<RouteRecord>,
}

impl VmRecord {
    /// Default gateways per family, from routes with a zero prefix length.
    pub fn default_gateways(&self) -> (Option<String>, Option<String>) {
        let mut ipv4 = None;
        let mut ipv6 = None;
        for route in &self.routes {
            if route.prefix_length != 0 || route.network.is_empty() || route.gateway.is_empty() {
                continue;
            }
            let Ok(network) = parse_interface_address(&route.network) else {
                continue;
            };
            match IpVersion::of(&network.ip()) {
                IpVersion::V4 => ipv4 = Some(route.gateway.clone()),
                IpVersion::V6 => ipv6 = Some(route.gateway.clone()),
            }
        }
        (ipv4, ipv6)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VmNicRecord {
    /// Device label, e.g. `Network adapter 1`.
    pub label: String,
    pub mac: String,
    pub connected: bool,
    /// Standard port group backing the NIC.
    pub network: Option<String>,
    pub dv_portgroup: Option<String>,
    pub dv_switch: Option<String>,
    /// Guest-reported addresses with prefix length.
    pub addresses: Vec<String>,
}

impl VmNicRecord {
    /// `Network adapter 1` -> `vNIC 1`.
    pub fn short_name(&self) -> String {
        let index = self.label.split_whitespace().last().unwrap_or_default();
        format!("vNIC {index}")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiskRecord {
    pub label: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub capacity_bytes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteRecord {
    pub network: String,
    pub prefix_length: u8,
    pub gateway: String,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
