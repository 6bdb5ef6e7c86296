use serde::{Deserialize, Serialize};

use super::{AssignedObject, Meta, ObjectId, ObjectKind};
use crate::utils::slugify;

pub const COLOR_GREEN: &str = "4caf50";
pub const COLOR_BLUE: &str = "2196f3";
pub const COLOR_GREY: &str = "9e9e9e";

/// Custom fields every source may set.
pub const CF_SOURCE: &str = "source";
pub const CF_SOURCE_ID: &str = "source_id";
pub const CF_UUID: &str = "uuid";
pub const CF_HOST_CPU_CORES: &str = "host_cpu_cores";
pub const CF_HOST_MEMORY: &str = "host_memory";
pub const CF_ARP_ENTRY: &str = "arp_entry";

/// Descriptions longer than this go to the object's comments instead.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
}

impl Tag {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            color: color.to_string(),
            ..Self::default()
        }
    }
}

crate::inventory_object!(Tag, ObjectKind::Tag,
    key: String = |s| s.name.clone(),
    merge: [slug, color]);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldType {
    #[default]
    Text,
    Integer,
    Boolean,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,
    /// Kinds the field may be set on.
    #[serde(default)]
    pub object_types: Vec<ObjectKind>,
    #[serde(default)]
    pub ui_visible_if_set: bool,
}

impl CustomField {
    pub fn text(name: &str, label: &str, object_types: &[ObjectKind]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type: CustomFieldType::Text,
            object_types: object_types.to_vec(),
            ui_visible_if_set: true,
            ..Self::default()
        }
    }
}

crate::inventory_object!(CustomField, ObjectKind::CustomField,
    key: String = |s| s.name.clone(),
    merge: [label, object_types]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
}

impl Tenant {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            ..Self::default()
        }
    }
}

crate::inventory_object!(Tenant, ObjectKind::Tenant,
    key: String = |s| s.name.clone(),
    merge: [slug]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

crate::inventory_object!(Contact, ObjectKind::Contact,
    key: String = |s| s.name.clone(),
    merge: [email]);

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRole {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub slug: String,
}

impl ContactRole {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            ..Self::default()
        }
    }
}

crate::inventory_object!(ContactRole, ObjectKind::ContactRole,
    key: String = |s| s.name.clone(),
    merge: [slug]);

/// Links a contact to any inventory object in a given role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactAssignment {
    #[serde(flatten)]
    pub meta: Meta,
    pub object: AssignedObject,
    pub contact: ObjectId,
    pub role: Option<ObjectId>,
}

crate::inventory_object!(ContactAssignment, ObjectKind::ContactAssignment,
    key: (AssignedObject, ObjectId, Option<ObjectId>) = |s| (s.object, s.contact, s.role),
    merge: []);
