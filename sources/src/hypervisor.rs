//! # Hypervisor Source
//!
//! Syncs a vSphere-like snapshot in six phases:
//! `tags -> networks -> datacenters -> clusters -> hosts -> vms`.
//!
//! Datacenters become cluster groups, hosts become devices of the `Server` role (unless a role
//! rule says otherwise) and VMs are synced concurrently through the worker pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use ssot_common::config::SourceConfig;
use ssot_common::model::*;
use ssot_common::{Result, SsotError};
use ssot_core::relations::Resolver;
use ssot_core::{IdMap, Inventory, Phase, Source, SyncContext};
use tracing::{debug, info};

mod hosts;
pub mod snapshot;
mod vms;

pub use snapshot::HypervisorSnapshot;

use crate::shared::source_meta;

pub(crate) const PHASES: &[Phase] = &[
    Phase::Tags,
    Phase::Networks,
    Phase::Datacenters,
    Phase::Clusters,
    Phase::Hosts,
    Phase::Vms,
];

pub const CLUSTER_TYPE: &str = "VMware ESXi";

pub struct HypervisorSource {
    inner: Arc<Hypervisor>,
}

/// State shared with the VM workers.
struct Hypervisor {
    config: SourceConfig,
    snapshot: HypervisorSnapshot,
    vid_names: BTreeMap<u16, String>,
    /// Object ID -> names of the tags synced for it.
    object_tags: IdMap<String, Vec<String>>,
}

impl HypervisorSource {
    pub fn new(config: SourceConfig, snapshot: HypervisorSnapshot) -> Self {
        let vid_names = snapshot.networks.vid_names();
        Self {
            inner: Arc::new(Hypervisor {
                config,
                snapshot,
                vid_names,
                object_tags: IdMap::new(),
            }),
        }
    }

    pub fn from_json(config: SourceConfig, text: &str) -> Result<Self> {
        let snapshot: HypervisorSnapshot = serde_json::from_str(text)?;
        debug!(
            source = %config.name,
            hosts = snapshot.hosts.len(),
            vms = snapshot.vms.len(),
            "hypervisor snapshot loaded"
        );
        Ok(Self::new(config, snapshot))
    }
}

#[async_trait]
impl Source for HypervisorSource {
    fn name(&self) -> &str {
        &self.inner.config.name
    }

    fn phases(&self) -> &'static [Phase] {
        PHASES
    }

    async fn run_phase(&self, phase: Phase, ctx: &SyncContext) -> Result<()> {
        let inventory = ctx.inventory.as_ref();
        match phase {
            Phase::Tags => self.inner.sync_tags(inventory).await,
            Phase::Networks => self.inner.sync_networks(inventory).await,
            Phase::Datacenters => self.inner.sync_datacenters(inventory).await,
            Phase::Clusters => self.inner.sync_clusters(inventory).await,
            Phase::Hosts => self.inner.sync_hosts(inventory).await,
            Phase::Vms => Hypervisor::sync_vms(Arc::clone(&self.inner), ctx).await,
            other => Err(SsotError::Config(format!("hypervisor sources have no {other} phase"))),
        }
    }
}

impl Hypervisor {
    /// Source meta plus the tags synced for `object_id`.
    fn meta(&self, inventory: &Inventory, object_id: Option<&str>) -> Meta {
        let mut meta = source_meta(inventory, &self.config, object_id);
        if let Some(tags) = object_id.and_then(|id| self.object_tags.get(&id.to_string())) {
            meta.tags.extend(tags);
        }
        meta
    }

    async fn sync_tags(&self, inventory: &Inventory) -> Result<()> {
        let (name, color) = crate::source_tag(&self.config);
        inventory.ensure_tag(&name, &color).await?;

        for (object_id, tags) in &self.snapshot.tags {
            let mut names = Vec::with_capacity(tags.len());
            for tag in tags {
                let description = if tag.description.is_empty() {
                    format!("Tag synced from {}", self.config.name)
                } else {
                    format!("Tag synced from {}: {}", self.config.name, tag.description)
                };
                let candidate = Tag {
                    meta: Meta::default().with_description(description),
                    ..Tag::new(&tag.name, COLOR_GREEN)
                };
                names.push(inventory.upsert(candidate).await?.name.clone());
            }
            self.object_tags.insert(object_id.clone(), names);
        }
        Ok(())
    }

    /// Distributed port groups carrying exactly one VLAN become VLANs.
    async fn sync_networks(&self, inventory: &Inventory) -> Result<()> {
        let resolver = Resolver::new(inventory, &self.config);
        for (pg_id, pg) in &self.snapshot.networks.portgroups {
            let Some(vid) = pg.single_vid() else {
                debug!(portgroup = %pg.name, "not a single-vlan port group");
                continue;
            };
            if vid > MAX_VID {
                continue;
            }

            let name = self.vlan_name(vid, &pg.name);
            let site = resolver.vlan_site(&name).await?;
            let group = resolver.vlan_group(&name, site.as_deref()).await?;
            let tenant = resolver.vlan_tenant(&name).await?;
            inventory
                .upsert(Vlan {
                    meta: self.meta(inventory, Some(pg_id)),
                    group: Some(group.id()),
                    vid,
                    name,
                    status: Some(VlanStatus::Active),
                    site: site.map(|s| s.id()),
                    tenant: tenant.map(|t| t.id()),
                })
                .await?;
        }
        Ok(())
    }

    async fn sync_datacenters(&self, inventory: &Inventory) -> Result<()> {
        let resolver = Resolver::new(inventory, &self.config);
        for (dc_id, dc) in &self.snapshot.datacenters {
            let name = resolver.cluster_group_name(&dc.name);
            let meta = self
                .meta(inventory, Some(dc_id))
                .with_description(format!("Datacenter from source {}", self.config.name));
            inventory
                .upsert(ClusterGroup {
                    meta,
                    ..ClusterGroup::named(name)
                })
                .await?;
        }
        Ok(())
    }

    async fn cluster_type(&self, inventory: &Inventory) -> Result<Arc<ClusterType>> {
        inventory
            .upsert(ClusterType {
                meta: self.meta(inventory, None),
                ..ClusterType::named(CLUSTER_TYPE)
            })
            .await
    }

    async fn sync_clusters(&self, inventory: &Inventory) -> Result<()> {
        let resolver = Resolver::new(inventory, &self.config);
        let cluster_type = self.cluster_type(inventory).await?;

        for (cluster_id, cluster) in &self.snapshot.clusters {
            let group = cluster
                .datacenter
                .as_ref()
                .and_then(|dc| self.snapshot.datacenters.get(dc))
                .and_then(|dc| {
                    let name = resolver.cluster_group_name(&dc.name).to_string();
                    inventory.lookup::<ClusterGroup>(&name)
                });
            let site = resolver.cluster_site(&cluster.name).await?;
            let tenant = resolver.cluster_tenant(&cluster.name).await?;

            inventory
                .upsert(Cluster {
                    meta: self.meta(inventory, Some(cluster_id)),
                    name: cluster.name.clone(),
                    cluster_type: cluster_type.id(),
                    group: group.map(|g| g.id()),
                    status: Some(ClusterStatus::Active),
                    scope: site.map(|s| s.assigned()),
                    tenant: tenant.map(|t| t.id()),
                })
                .await?;
        }
        info!(source = %self.config.name, clusters = self.snapshot.clusters.len(), "clusters registered");
        Ok(())
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
    use pretty_assertions::assert_eq;
    use ssot_common::config::SourceType;
    use ssot_common::matcher::RelationRules;
    use ssot_core::{MemoryTarget, SyncOrchestrator};

    const SNAPSHOT: &str = r#"{
        "tags": { "dvpg-10": [{ "name": "prod", "description": "production" }] },
        "networks": {
            "portgroups": {
                "dvpg-10": { "name": "backend", "vlan_ids": [10] },
                "dvpg-trunk": { "name": "trunk", "vlan_ids": [4095] },
                "dvpg-none": { "name": "untagged", "vlan_ids": [0] }
            }
        },
        "datacenters": { "dc-1": { "name": "DC1" } },
        "clusters": { "c-1": { "name": "prod-cluster", "datacenter": "dc-1" } }
    }"#;

    fn config() -> SourceConfig {
        let mut config = SourceConfig::new("vc", SourceType::Hypervisor);
        config.datacenter_cluster_group_relations =
            vec!["DC1 = Primary".to_string()].try_into().unwrap();
        config.cluster_site_relations = Some(RelationRules::from_pairs(&[("^prod", "Ljubljana")]).unwrap());
        config
    }

    async fn run(phases: &[Phase]) -> (Arc<MemoryTarget>, Arc<Inventory>) {
        let target = Arc::new(MemoryTarget::new());
        let inventory = Arc::new(Inventory::new(target.clone(), "ssot"));
        let orchestrator = SyncOrchestrator::new(Arc::clone(&inventory), 4);
        let source = HypervisorSource::from_json(config(), SNAPSHOT).unwrap();
        for &phase in phases {
            orchestrator.run_phase(&source, phase).await.unwrap();
        }
        (target, inventory)
    }

    #[tokio::test]
    async fn only_single_vlan_port_groups_become_vlans() {
        let (_, inv) = run(&[Phase::Tags, Phase::Networks]).await;

        let vlans = inv.all::<Vlan>();
        assert_eq!(vlans.len(), 1);
        assert_eq!(vlans[0].name, "VLAN0010_backend");
        assert_eq!(vlans[0].vid, 10);
        assert!(vlans[0].meta.tags.contains("prod"));
        assert!(vlans[0].meta.tags.contains("vc"));
        assert_eq!(vlans[0].meta.custom_fields[CF_SOURCE_ID], "dvpg-10");
    }

    #[tokio::test]
    async fn clusters_join_remapped_datacenter_group_and_site() {
        let (_, inv) = run(&[Phase::Datacenters, Phase::Clusters]).await;

        let group = inv.lookup::<ClusterGroup>(&"Primary".to_string()).unwrap();
        let site = inv.lookup::<Site>(&"Ljubljana".to_string()).unwrap();
        let cluster = inv.lookup::<Cluster>(&"prod-cluster".to_string()).unwrap();

        assert_eq!(cluster.group, Some(group.id()));
        assert_eq!(cluster.scope, Some(site.assigned()));
        assert!(inv.lookup::<ClusterType>(&CLUSTER_TYPE.to_string()).is_some());
    }

    #[tokio::test]
    async fn unknown_phase_is_refused() {
        let target = Arc::new(MemoryTarget::new());
        let inventory = Arc::new(Inventory::new(target, "ssot"));
        let orchestrator = SyncOrchestrator::new(inventory, 1);
        let source = HypervisorSource::from_json(config(), "{}").unwrap();

        let err = orchestrator.run_phase(&source, Phase::WirelessLans).await.unwrap_err();
        assert!(matches!(err, SsotError::Phase { .. }));
    }
}
