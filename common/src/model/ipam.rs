//! Addressing: IP addresses, prefixes and VLANs.

use serde::{Deserialize, Serialize};

use super::{AssignedObject, Meta, ObjectId, ObjectKind};
use crate::utils::slugify;

pub const DEFAULT_VID: u16 = 1;
pub const MAX_VID: u16 = 4094;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpAddressStatus {
    Active,
    Reserved,
    Deprecated,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpAddress {
    #[serde(flatten)]
    pub meta: Meta,
    /// Address with prefix length, e.g. `10.0.1.5/24`.
    pub address: String,
    pub status: Option<IpAddressStatus>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dns_name: String,
    pub tenant: Option<ObjectId>,
    pub assigned: Option<AssignedObject>,
}

crate::inventory_object!(IpAddress, ObjectKind::IpAddress,
    key: String = |s| s.address.clone(),
    merge: [status, dns_name, tenant, assigned]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefix {
    #[serde(flatten)]
    pub meta: Meta,
    /// Network in CIDR notation, e.g. `10.0.1.0/24`.
    pub prefix: String,
    pub site: Option<ObjectId>,
    pub tenant: Option<ObjectId>,
    pub vlan: Option<ObjectId>,
}

crate::inventory_object!(Prefix, ObjectKind::Prefix,
    key: String = |s| s.prefix.clone(),
    merge: [site, tenant, vlan]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlanGroup {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
    /// Site (or other object) the group is restricted to.
    pub scope: Option<AssignedObject>,
    pub min_vid: u16,
    pub max_vid: u16,
}

impl VlanGroup {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            min_vid: DEFAULT_VID,
            max_vid: MAX_VID,
            ..Self::default()
        }
    }
}

crate::inventory_object!(VlanGroup, ObjectKind::VlanGroup,
    key: String = |s| s.name.clone(),
    merge: [slug, scope, min_vid, max_vid]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VlanStatus {
    Active,
    Reserved,
    Deprecated,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vlan {
    #[serde(flatten)]
    pub meta: Meta,
    pub group: Option<ObjectId>,
    pub vid: u16,
    pub name: String,
    pub status: Option<VlanStatus>,
    pub site: Option<ObjectId>,
    pub tenant: Option<ObjectId>,
}

crate::inventory_object!(Vlan, ObjectKind::Vlan,
    key: (Option<ObjectId>, u16) = |s| (s.group, s.vid),
    merge: [name, status, site, tenant]);

/// Name a VLAN gets when the source only knows the port group it is carried on.
pub fn vlan_display_name(vid: u16, name: &str) -> String {
    if name.starts_with("VLAN") {
        name.to_string()
    } else {
        format!("VLAN{vid:04}_{name}")
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlan_names_are_prefixed_with_padded_vid() {
        assert_eq!(vlan_display_name(42, "backend"), "VLAN0042_backend");
        assert_eq!(vlan_display_name(42, "VLAN42-backend"), "VLAN42-backend");
    }
}
