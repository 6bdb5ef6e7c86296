use serde::{Deserialize, Serialize};

use super::{Meta, ObjectId, ObjectKind};
use crate::utils::slugify;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirelessLanGroup {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
}

impl WirelessLanGroup {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            ..Self::default()
        }
    }
}

crate::inventory_object!(WirelessLanGroup, ObjectKind::WirelessLanGroup,
    key: String = |s| s.name.clone(),
    merge: [slug]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WirelessAuthType {
    Open,
    Wep,
    WpaPersonal,
    WpaEnterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WirelessAuthCipher {
    Auto,
    Tkip,
    Aes,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirelessLan {
    #[serde(flatten)]
    pub meta: Meta,
    pub ssid: String,
    pub group: Option<ObjectId>,
    pub vlan: Option<ObjectId>,
    pub auth_type: Option<WirelessAuthType>,
    pub auth_cipher: Option<WirelessAuthCipher>,
}

crate::inventory_object!(WirelessLan, ObjectKind::WirelessLan,
    key: String = |s| s.ssid.clone(),
    merge: [group, vlan, auth_type, auth_cipher]);
