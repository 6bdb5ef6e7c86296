//! # Target Inventory Model
//!
//! Every object the reconciler writes implements [`InventoryObject`]: it knows its
//! [`ObjectKind`], how to compute its natural key and how to merge an incoming candidate
//! of the same kind into itself.
//!
//! ## Merge precedence
//! * tags are unioned;
//! * custom fields with a non-blank incoming value overwrite;
//! * any other field overwrites only when the incoming value is not [`Blank`];
//! * the stored identity is never replaced.
//!
//! Relations between objects are carried as [`ObjectId`]s, so a published object never
//! embeds another one and can be shared as an `Arc<T>`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod dcim;
pub mod extras;
pub mod ipam;
pub mod virtualization;
pub mod wireless;

pub use dcim::*;
pub use extras::*;
pub use ipam::*;
pub use virtualization::*;
pub use wireless::*;

/// Identity assigned by the target inventory on first creation.
///
/// `ObjectId::UNSET` (zero) marks a candidate that has not been registered yet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    pub const UNSET: ObjectId = ObjectId(0);

    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Tag,
    CustomField,
    Site,
    Tenant,
    Contact,
    ContactRole,
    ContactAssignment,
    ClusterGroup,
    ClusterType,
    Cluster,
    Manufacturer,
    DeviceType,
    Platform,
    DeviceRole,
    Device,
    Interface,
    MacAddress,
    IpAddress,
    Prefix,
    VlanGroup,
    Vlan,
    Vm,
    VmInterface,
    VirtualDisk,
    WirelessLanGroup,
    WirelessLan,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 26] = [
        ObjectKind::Tag,
        ObjectKind::CustomField,
        ObjectKind::Site,
        ObjectKind::Tenant,
        ObjectKind::Contact,
        ObjectKind::ContactRole,
        ObjectKind::ContactAssignment,
        ObjectKind::ClusterGroup,
        ObjectKind::ClusterType,
        ObjectKind::Cluster,
        ObjectKind::Manufacturer,
        ObjectKind::DeviceType,
        ObjectKind::Platform,
        ObjectKind::DeviceRole,
        ObjectKind::Device,
        ObjectKind::Interface,
        ObjectKind::MacAddress,
        ObjectKind::IpAddress,
        ObjectKind::Prefix,
        ObjectKind::VlanGroup,
        ObjectKind::Vlan,
        ObjectKind::Vm,
        ObjectKind::VmInterface,
        ObjectKind::VirtualDisk,
        ObjectKind::WirelessLanGroup,
        ObjectKind::WirelessLan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Tag => "tag",
            ObjectKind::CustomField => "custom_field",
            ObjectKind::Site => "site",
            ObjectKind::Tenant => "tenant",
            ObjectKind::Contact => "contact",
            ObjectKind::ContactRole => "contact_role",
            ObjectKind::ContactAssignment => "contact_assignment",
            ObjectKind::ClusterGroup => "cluster_group",
            ObjectKind::ClusterType => "cluster_type",
            ObjectKind::Cluster => "cluster",
            ObjectKind::Manufacturer => "manufacturer",
            ObjectKind::DeviceType => "device_type",
            ObjectKind::Platform => "platform",
            ObjectKind::DeviceRole => "device_role",
            ObjectKind::Device => "device",
            ObjectKind::Interface => "interface",
            ObjectKind::MacAddress => "mac_address",
            ObjectKind::IpAddress => "ip_address",
            ObjectKind::Prefix => "prefix",
            ObjectKind::VlanGroup => "vlan_group",
            ObjectKind::Vlan => "vlan",
            ObjectKind::Vm => "virtual_machine",
            ObjectKind::VmInterface => "vm_interface",
            ObjectKind::VirtualDisk => "virtual_disk",
            ObjectKind::WirelessLanGroup => "wireless_lan_group",
            ObjectKind::WirelessLan => "wireless_lan",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the object another object is attached to (MAC / IP assignment,
/// contact assignment, VLAN group scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignedObject {
    pub kind: ObjectKind,
    pub id: ObjectId,
}

impl AssignedObject {
    pub fn new(kind: ObjectKind, id: ObjectId) -> Self {
        Self { kind, id }
    }
}

/// Fields common to every inventory object.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "ObjectId::is_unset")]
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,
}

impl Meta {
    pub fn tagged<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_fields.insert(name.into(), value.into());
        self
    }

    /// Merges `incoming` into `self`, returning whether anything changed.
    pub fn merge(&mut self, incoming: &Meta) -> bool {
        let mut changed = merge_value(&mut self.description, &incoming.description);

        for tag in &incoming.tags {
            changed |= self.tags.insert(tag.clone());
        }

        for (name, value) in &incoming.custom_fields {
            if value.is_blank() || self.custom_fields.get(name) == Some(value) {
                continue;
            }
            self.custom_fields.insert(name.clone(), value.clone());
            changed = true;
        }

        changed
    }
}

/// A value that counts as "not set" for merge purposes.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Blank for Option<T> {
    fn is_blank(&self) -> bool {
        self.is_none()
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for ObjectId {
    fn is_blank(&self) -> bool {
        self.is_unset()
    }
}

impl Blank for Value {
    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

macro_rules! blank_when_zero {
    ($($ty:ty),*) => {
        $(impl Blank for $ty {
            fn is_blank(&self) -> bool {
                *self == <$ty>::default()
            }
        })*
    };
}

blank_when_zero!(u16, u32, u64, i32, i64);

/// Overwrites `dst` with `src` unless `src` is blank; returns whether `dst` changed.
pub fn merge_value<T>(dst: &mut T, src: &T) -> bool
where
    T: Blank + PartialEq + Clone,
{
    if src.is_blank() || dst == src {
        return false;
    }
    *dst = src.clone();
    true
}

/// An object that lives in the target inventory.
pub trait InventoryObject: Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    const KIND: ObjectKind;

    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn natural_key(&self) -> Self::Key;

    fn meta(&self) -> &Meta;

    fn meta_mut(&mut self) -> &mut Meta;

    /// Merges the kind-specific fields of `incoming`; returns whether anything changed.
    fn merge_fields(&mut self, incoming: &Self) -> bool;

    fn id(&self) -> ObjectId {
        self.meta().id
    }

    fn assigned(&self) -> AssignedObject {
        AssignedObject::new(Self::KIND, self.id())
    }
}

/// Implements [`InventoryObject`] for a struct with a `meta: Meta` field.
///
/// ```ignore
/// inventory_object!(Site, ObjectKind::Site, key: String = |s| s.name.clone(), merge: [name, slug]);
/// ```
#[macro_export]
macro_rules! inventory_object {
    ($ty:ident, $kind:expr, key: $key:ty = |$s:ident| $key_expr:expr, merge: [$($field:ident),* $(,)?]) => {
        impl $crate::model::InventoryObject for $ty {
            const KIND: $crate::model::ObjectKind = $kind;

            type Key = $key;

            fn natural_key(&self) -> Self::Key {
                let $s = self;
                $key_expr
            }

            fn meta(&self) -> &$crate::model::Meta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::model::Meta {
                &mut self.meta
            }

            #[allow(unused_mut)]
            fn merge_fields(&mut self, incoming: &Self) -> bool {
                let mut changed = false;
                $(changed |= $crate::model::merge_value(&mut self.$field, &incoming.$field);)*
                changed
            }
        }
    };
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
