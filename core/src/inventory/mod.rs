//! # Inventory Cache
//!
//! The single source of truth for what the target inventory contains during a run.
//!
//! [`Inventory::upsert`] is get-or-create-or-update for every object kind:
//! 1. take the per-key lock of the kind's [`Registry`];
//! 2. no object under the natural key: create it upstream, stamp the returned identity and
//!    publish it;
//! 3. otherwise merge the candidate into a copy of the stored object and, only when the
//!    merge changed something, update upstream and publish the copy.
//!
//! Setting a primary address or MAC is just another upsert of a modified copy.

use std::sync::Arc;

use ssot_common::model::*;
use ssot_common::{Result, SsotError};
use tracing::debug;

use crate::target::TargetClient;

mod defaults;
mod registry;
mod stats;

pub use defaults::{
    ADMIN_CONTACT_ROLE, DEFAULT_SITE, DEFAULT_VLAN_GROUP, SERVER_ROLE, VM_ROLE, VM_TEMPLATE_ROLE,
};
pub use registry::Registry;
pub use stats::{KindStats, UpsertStats};

use stats::Outcome;

/// Gives [`Inventory`] access to the registry of one object kind.
pub trait HasRegistry<T: InventoryObject> {
    fn registry(&self) -> &Registry<T>;
}

macro_rules! registries {
    ($($field:ident: $ty:ty),* $(,)?) => {
        #[derive(Default)]
        struct Registries {
            $($field: Registry<$ty>,)*
        }

        $(impl HasRegistry<$ty> for Inventory {
            fn registry(&self) -> &Registry<$ty> {
                &self.registries.$field
            }
        })*
    };
}

registries! {
    tags: Tag,
    custom_fields: CustomField,
    sites: Site,
    tenants: Tenant,
    contacts: Contact,
    contact_roles: ContactRole,
    contact_assignments: ContactAssignment,
    cluster_groups: ClusterGroup,
    cluster_types: ClusterType,
    clusters: Cluster,
    manufacturers: Manufacturer,
    device_types: DeviceType,
    platforms: Platform,
    device_roles: DeviceRole,
    devices: Device,
    interfaces: Interface,
    mac_addresses: MacAddress,
    ip_addresses: IpAddress,
    prefixes: Prefix,
    vlan_groups: VlanGroup,
    vlans: Vlan,
    vms: Vm,
    vm_interfaces: VmInterface,
    virtual_disks: VirtualDisk,
    wireless_lan_groups: WirelessLanGroup,
    wireless_lans: WirelessLan,
}

pub struct Inventory {
    client: Arc<dyn TargetClient>,
    /// Tag put on the default objects the inventory creates by itself.
    tag: String,
    registries: Registries,
    stats: UpsertStats,
}

impl Inventory {
    pub fn new(client: Arc<dyn TargetClient>, tag: impl Into<String>) -> Self {
        Self {
            client,
            tag: tag.into(),
            registries: Registries::default(),
            stats: UpsertStats::default(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn stats(&self) -> &UpsertStats {
        &self.stats
    }

    /// Published object of kind `T` under `key`, if any. Never contacts the target.
    pub fn lookup<T>(&self, key: &T::Key) -> Option<Arc<T>>
    where
        T: InventoryObject,
        Self: HasRegistry<T>,
    {
        HasRegistry::<T>::registry(self).get(key)
    }

    pub fn all<T>(&self) -> Vec<Arc<T>>
    where
        T: InventoryObject,
        Self: HasRegistry<T>,
    {
        HasRegistry::<T>::registry(self).all()
    }

    pub fn count<T>(&self) -> usize
    where
        T: InventoryObject,
        Self: HasRegistry<T>,
    {
        HasRegistry::<T>::registry(self).len()
    }

    /// Creates, merges or leaves alone the object under the candidate's natural key.
    pub async fn upsert<T>(&self, candidate: T) -> Result<Arc<T>>
    where
        T: InventoryObject,
        Self: HasRegistry<T>,
    {
        let registry = HasRegistry::<T>::registry(self);
        let key = candidate.natural_key();
        let lock = registry.key_lock(&key);
        let _guard = lock.lock().await;

        match registry.get(&key) {
            None => {
                let payload = serde_json::to_value(&candidate)?;
                let id = self
                    .client
                    .create(T::KIND, payload)
                    .await
                    .map_err(|e| reject_context::<T>(e, &key))?;

                let mut created = candidate;
                created.meta_mut().id = id;
                let created = Arc::new(created);
                registry.publish(key, Arc::clone(&created));
                self.stats.record(T::KIND, Outcome::Created);
                debug!(kind = %T::KIND, id = %id, "created");
                Ok(created)
            }
            Some(existing) => {
                let mut merged = (*existing).clone();
                let meta_changed = merged.meta_mut().merge(candidate.meta());
                let fields_changed = merged.merge_fields(&candidate);
                if !(meta_changed || fields_changed) {
                    self.stats.record(T::KIND, Outcome::Unchanged);
                    return Ok(existing);
                }

                let id = merged.id();
                let payload = serde_json::to_value(&merged)?;
                self.client
                    .update(T::KIND, id, payload)
                    .await
                    .map_err(|e| reject_context::<T>(e, &key))?;

                let merged = Arc::new(merged);
                registry.publish(key, Arc::clone(&merged));
                self.stats.record(T::KIND, Outcome::Updated);
                debug!(kind = %T::KIND, id = %id, "updated");
                Ok(merged)
            }
        }
    }
}

/// Puts the natural key on rejections that arrived without one.
fn reject_context<T: InventoryObject>(err: SsotError, key: &T::Key) -> SsotError {
    match err {
        SsotError::Rejected { reason, .. } => SsotError::rejected(T::KIND, key, reason),
        other => other,
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
