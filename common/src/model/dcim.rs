//! Physical inventory: sites, hardware catalog, devices and their interfaces.

use serde::{Deserialize, Serialize};

use super::{AssignedObject, Meta, ObjectId, ObjectKind};
use crate::utils::slugify;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub physical_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Site {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            ..Self::default()
        }
    }
}

crate::inventory_object!(Site, ObjectKind::Site,
    key: String = |s| s.name.clone(),
    merge: [slug, physical_address, latitude, longitude]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
}

impl Manufacturer {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            ..Self::default()
        }
    }
}

crate::inventory_object!(Manufacturer, ObjectKind::Manufacturer,
    key: String = |s| s.name.clone(),
    merge: [slug]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceType {
    #[serde(flatten)]
    pub meta: Meta,
    pub manufacturer: ObjectId,
    pub model: String,
    pub slug: String,
}

crate::inventory_object!(DeviceType, ObjectKind::DeviceType,
    key: (ObjectId, String) = |s| (s.manufacturer, s.model.clone()),
    merge: [slug]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<ObjectId>,
}

impl Platform {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            ..Self::default()
        }
    }
}

crate::inventory_object!(Platform, ObjectKind::Platform,
    key: String = |s| s.name.clone(),
    merge: [slug, manufacturer]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRole {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_role: Option<bool>,
}

impl DeviceRole {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            ..Self::default()
        }
    }
}

crate::inventory_object!(DeviceRole, ObjectKind::DeviceRole,
    key: String = |s| s.name.clone(),
    merge: [slug, color, vm_role]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Active,
    Offline,
    Planned,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub site: Option<ObjectId>,
    pub device_type: Option<ObjectId>,
    pub role: Option<ObjectId>,
    pub platform: Option<ObjectId>,
    pub tenant: Option<ObjectId>,
    pub cluster: Option<ObjectId>,
    pub status: Option<DeviceStatus>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub serial: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asset_tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comments: String,
    pub primary_ipv4: Option<ObjectId>,
    pub primary_ipv6: Option<ObjectId>,
}

crate::inventory_object!(Device, ObjectKind::Device,
    key: (String, Option<ObjectId>) = |s| (s.name.clone(), s.site),
    merge: [device_type, role, platform, tenant, cluster, status, serial, asset_tag, comments,
            primary_ipv4, primary_ipv6]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceMode {
    Access,
    Tagged,
    #[serde(rename = "tagged-all")]
    TaggedAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceType {
    #[serde(rename = "virtual")]
    Virtual,
    #[serde(rename = "other")]
    Other,
    #[serde(rename = "100base-tx")]
    FastEthernet,
    #[serde(rename = "1000base-t")]
    GigabitEthernet,
    #[serde(rename = "10gbase-x-sfpp")]
    TenGigabit,
    #[serde(rename = "25gbase-x-sfp28")]
    TwentyFiveGigabit,
    #[serde(rename = "40gbase-x-qsfpp")]
    FortyGigabit,
    #[serde(rename = "100gbase-x-qsfp28")]
    HundredGigabit,
}

impl InterfaceType {
    /// Physical interface type for a link speed in kbit/s.
    pub fn from_speed_kbps(speed: u64) -> InterfaceType {
        match speed {
            100_000 => InterfaceType::FastEthernet,
            1_000_000 => InterfaceType::GigabitEthernet,
            10_000_000 => InterfaceType::TenGigabit,
            25_000_000 => InterfaceType::TwentyFiveGigabit,
            40_000_000 => InterfaceType::FortyGigabit,
            100_000_000 => InterfaceType::HundredGigabit,
            _ => InterfaceType::Other,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(flatten)]
    pub meta: Meta,
    pub device: ObjectId,
    pub name: String,
    pub interface_type: Option<InterfaceType>,
    /// Link speed in kbit/s.
    #[serde(default)]
    pub speed: u64,
    #[serde(default)]
    pub mtu: u32,
    pub mode: Option<InterfaceMode>,
    pub enabled: Option<bool>,
    pub untagged_vlan: Option<ObjectId>,
    #[serde(default)]
    pub tagged_vlans: Vec<ObjectId>,
    pub primary_mac: Option<ObjectId>,
}

crate::inventory_object!(Interface, ObjectKind::Interface,
    key: (ObjectId, String) = |s| (s.device, s.name.clone()),
    merge: [interface_type, speed, mtu, mode, enabled, untagged_vlan, tagged_vlans, primary_mac]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacAddress {
    #[serde(flatten)]
    pub meta: Meta,
    /// Upper-case, colon separated.
    pub mac: String,
    pub assigned: Option<AssignedObject>,
}

crate::inventory_object!(MacAddress, ObjectKind::MacAddress,
    key: (String, Option<AssignedObject>) = |s| (s.mac.clone(), s.assigned),
    merge: []);

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
