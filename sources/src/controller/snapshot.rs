//! Records of a network-controller snapshot.

use std::collections::BTreeMap;

use serde::Deserialize;
use ssot_common::model::{WirelessAuthCipher, WirelessAuthType};

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ControllerSnapshot {
    pub sites: BTreeMap<String, SiteRecord>,
    pub devices: BTreeMap<String, DeviceRecord>,
    pub interfaces: BTreeMap<String, InterfaceRecord>,
    pub vlans: BTreeMap<u16, VlanRecord>,
    pub wireless: Vec<WirelessProfileRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    Area,
    Building,
    Floor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteRecord {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub kind: SiteKind,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl ControllerSnapshot {
    /// ID of the nearest building at or above `site_id`.
    pub fn building_of<'a>(&'a self, site_id: &'a str) -> Option<&'a str> {
        let mut current = site_id;
        // A parent chain longer than the site count is a cycle.
        for _ in 0..=self.sites.len() {
            let site = self.sites.get(current)?;
            if site.kind == SiteKind::Building {
                return Some(current);
            }
            current = site.parent.as_deref()?;
        }
        None
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
    pub hostname: String,
    /// Site ID the device is a member of.
    pub site: Option<String>,
    /// e.g. `Switches and Hubs`, `Unified AP`.
    pub family: String,
    /// Hardware model, e.g. `C9300-48P`.
    pub platform_id: String,
    pub software_type: String,
    pub software_version: String,
    pub serial: String,
    pub management_address: Option<String>,
    pub reachable: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InterfaceRecord {
    /// Device ID.
    pub device: String,
    pub name: String,
    pub mac: String,
    pub speed_kbps: u64,
    pub mtu: u32,
    pub ipv4: Option<String>,
    pub netmask: Option<String>,
    pub vlan: Option<u16>,
    /// `access`, `trunk` or `routed`.
    pub port_mode: String,
    pub admin_up: bool,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VlanRecord {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirelessProfileRecord {
    pub name: String,
    #[serde(default)]
    pub ssids: Vec<SsidRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SsidRecord {
    pub ssid: String,
    pub vlan: Option<u16>,
    pub auth: String,
    pub cipher: String,
}

impl SsidRecord {
    pub fn auth_type(&self) -> Option<WirelessAuthType> {
        let auth = self.auth.to_lowercase();
        match auth.as_str() {
            "" => None,
            "open" => Some(WirelessAuthType::Open),
            "wep" => Some(WirelessAuthType::Wep),
            _ if auth.contains("enterprise") => Some(WirelessAuthType::WpaEnterprise),
            _ if auth.contains("personal") || auth.contains("psk") => Some(WirelessAuthType::WpaPersonal),
            _ => None,
        }
    }

    pub fn auth_cipher(&self) -> Option<WirelessAuthCipher> {
        match self.cipher.to_lowercase().as_str() {
            "aes" | "ccmp" | "gcmp" => Some(WirelessAuthCipher::Aes),
            "tkip" => Some(WirelessAuthCipher::Tkip),
            "auto" => Some(WirelessAuthCipher::Auto),
            _ => None,
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

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, parent: Option<&str>, kind: SiteKind) -> SiteRecord {
        SiteRecord {
            name: name.into(),
            parent: parent.map(str::to_string),
            kind,
            address: String::new(),
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn floors_resolve_to_their_building() {
        let snapshot = ControllerSnapshot {
            sites: BTreeMap::from([
                ("global".to_string(), site("Global", None, SiteKind::Area)),
                ("b1".to_string(), site("HQ", Some("global"), SiteKind::Building)),
                ("f1".to_string(), site("Floor 1", Some("b1"), SiteKind::Floor)),
                ("loop".to_string(), site("Loop", Some("loop"), SiteKind::Floor)),
            ]),
            ..ControllerSnapshot::default()
        };

        assert_eq!(snapshot.building_of("f1"), Some("b1"));
        assert_eq!(snapshot.building_of("b1"), Some("b1"));
        assert_eq!(snapshot.building_of("global"), None);
        assert_eq!(snapshot.building_of("loop"), None);
        assert_eq!(snapshot.building_of("missing"), None);
    }

    #[test]
    fn ssid_security_maps_to_auth_details() {
        let ssid = |auth: &str, cipher: &str| SsidRecord {
            auth: auth.into(),
            cipher: cipher.into(),
            ..SsidRecord::default()
        };
        assert_eq!(ssid("WPA2_ENTERPRISE", "").auth_type(), Some(WirelessAuthType::WpaEnterprise));
        assert_eq!(ssid("wpa2_personal", "aes").auth_type(), Some(WirelessAuthType::WpaPersonal));
        assert_eq!(ssid("open", "").auth_type(), Some(WirelessAuthType::Open));
        assert_eq!(ssid("", "tkip").auth_cipher(), Some(WirelessAuthCipher::Tkip));
        assert_eq!(ssid("", "").auth_cipher(), None);
    }
}
