use serde::{Deserialize, Serialize};

use super::{AssignedObject, Meta, ObjectId, ObjectKind};
use crate::model::InterfaceMode;
use crate::utils::slugify;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterGroup {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
}

impl ClusterGroup {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            ..Self::default()
        }
    }
}

crate::inventory_object!(ClusterGroup, ObjectKind::ClusterGroup,
    key: String = |s| s.name.clone(),
    merge: [slug]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterType {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
}

impl ClusterType {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            ..Self::default()
        }
    }
}

crate::inventory_object!(ClusterType, ObjectKind::ClusterType,
    key: String = |s| s.name.clone(),
    merge: [slug]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStatus {
    Active,
    Offline,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub cluster_type: ObjectId,
    pub group: Option<ObjectId>,
    pub status: Option<ClusterStatus>,
    /// Usually the site the cluster lives in.
    pub scope: Option<AssignedObject>,
    pub tenant: Option<ObjectId>,
}

crate::inventory_object!(Cluster, ObjectKind::Cluster,
    key: String = |s| s.name.clone(),
    merge: [cluster_type, group, status, scope, tenant]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmStatus {
    Active,
    Offline,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vm {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub cluster: Option<ObjectId>,
    pub site: Option<ObjectId>,
    pub tenant: Option<ObjectId>,
    /// Device the VM currently runs on.
    pub host: Option<ObjectId>,
    pub platform: Option<ObjectId>,
    pub role: Option<ObjectId>,
    pub status: Option<VmStatus>,
    #[serde(default)]
    pub vcpus: u32,
    /// Memory in MB.
    #[serde(default)]
    pub memory: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comments: String,
    pub primary_ipv4: Option<ObjectId>,
    pub primary_ipv6: Option<ObjectId>,
}

crate::inventory_object!(Vm, ObjectKind::Vm,
    key: (String, Option<ObjectId>) = |s| (s.name.clone(), s.cluster),
    merge: [site, tenant, host, platform, role, status, vcpus, memory, comments,
            primary_ipv4, primary_ipv6]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmInterface {
    #[serde(flatten)]
    pub meta: Meta,
    pub vm: ObjectId,
    pub name: String,
    #[serde(default)]
    pub mtu: u32,
    pub mode: Option<InterfaceMode>,
    pub enabled: Option<bool>,
    pub untagged_vlan: Option<ObjectId>,
    #[serde(default)]
    pub tagged_vlans: Vec<ObjectId>,
    pub primary_mac: Option<ObjectId>,
}

crate::inventory_object!(VmInterface, ObjectKind::VmInterface,
    key: (ObjectId, String) = |s| (s.vm, s.name.clone()),
    merge: [mtu, mode, enabled, untagged_vlan, tagged_vlans, primary_mac]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualDisk {
    #[serde(flatten)]
    pub meta: Meta,
    pub vm: ObjectId,
    pub name: String,
    /// Size in MiB.
    pub size: u64,
}

crate::inventory_object!(VirtualDisk, ObjectKind::VirtualDisk,
    key: (ObjectId, String) = |s| (s.vm, s.name.clone()),
    merge: [size]);
