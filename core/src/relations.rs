//! # Relation Resolvers
//!
//! Turn a rule match into an inventory object. Each relation decides on its own what
//! "no rules" and "no match" mean:
//!
//! | relation | unconfigured | unmatched |
//! |---|---|---|
//! | site (cluster, host, VLAN) | none | default site |
//! | tenant (cluster, host, VM, VLAN) | none | none |
//! | role (host, VM) | caller's default role | caller's default role |
//! | VLAN group | default group of the VLAN's site | default group of the VLAN's site |

use std::sync::Arc;

use ssot_common::Result;
use ssot_common::config::SourceConfig;
use ssot_common::matcher::{Relation, RelationRules, match_subject};
use ssot_common::model::{DeviceRole, InventoryObject, Site, Tenant, VlanGroup};
use tracing::debug;

use crate::inventory::Inventory;

/// The role a host or VM gets when no role rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRole {
    Server,
    Vm,
    VmTemplate,
}

/// Resolves relations of one source's entities against its configured rules.
pub struct Resolver<'a> {
    inventory: &'a Inventory,
    config: &'a SourceConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(inventory: &'a Inventory, config: &'a SourceConfig) -> Self {
        Self { inventory, config }
    }

    pub async fn cluster_site(&self, cluster: &str) -> Result<Option<Arc<Site>>> {
        self.site(cluster, self.config.cluster_site_relations.as_ref()).await
    }

    pub async fn cluster_tenant(&self, cluster: &str) -> Result<Option<Arc<Tenant>>> {
        self.tenant(cluster, self.config.cluster_tenant_relations.as_ref()).await
    }

    pub async fn host_site(&self, host: &str) -> Result<Option<Arc<Site>>> {
        self.site(host, self.config.host_site_relations.as_ref()).await
    }

    pub async fn host_tenant(&self, host: &str) -> Result<Option<Arc<Tenant>>> {
        self.tenant(host, self.config.host_tenant_relations.as_ref()).await
    }

    pub async fn host_role(&self, host: &str) -> Result<Arc<DeviceRole>> {
        self.role(host, self.config.host_role_relations.as_ref(), DefaultRole::Server)
            .await
    }

    pub async fn vm_tenant(&self, vm: &str) -> Result<Option<Arc<Tenant>>> {
        self.tenant(vm, self.config.vm_tenant_relations.as_ref()).await
    }

    pub async fn vm_role(&self, vm: &str, template: bool) -> Result<Arc<DeviceRole>> {
        let fallback = if template {
            DefaultRole::VmTemplate
        } else {
            DefaultRole::Vm
        };
        self.role(vm, self.config.vm_role_relations.as_ref(), fallback).await
    }

    pub async fn vlan_site(&self, vlan: &str) -> Result<Option<Arc<Site>>> {
        self.site(vlan, self.config.vlan_site_relations.as_ref()).await
    }

    pub async fn vlan_tenant(&self, vlan: &str) -> Result<Option<Arc<Tenant>>> {
        self.tenant(vlan, self.config.vlan_tenant_relations.as_ref()).await
    }

    /// Group for a VLAN. A matched group is scoped to the site the VLAN-group-to-site rules
    /// pick, if any; otherwise the VLAN's own site gets its default group.
    pub async fn vlan_group(&self, vlan: &str, vlan_site: Option<&Site>) -> Result<Arc<VlanGroup>> {
        let Some(group_name) =
            match_subject(vlan, self.config.vlan_group_relations.as_ref()).matched()
        else {
            return self.inventory.default_vlan_group_for_site(vlan_site).await;
        };

        let mut group = VlanGroup {
            meta: self.own_meta(),
            ..VlanGroup::named(group_name)
        };
        if let Some(site_name) =
            match_subject(vlan, self.config.vlan_group_site_relations.as_ref()).matched()
        {
            let site = self.named_site(site_name).await?;
            group.scope = Some(site.assigned());
        }
        self.inventory.upsert(group).await
    }

    /// Cluster group a datacenter maps to; exact-name remapping, not patterns.
    pub fn cluster_group_name<'n>(&'n self, datacenter: &'n str) -> &'n str {
        let name = self.config.datacenter_cluster_group_relations.resolve(datacenter);
        if name != datacenter {
            debug!(datacenter, cluster_group = name, "datacenter remapped");
        }
        name
    }

    async fn site(&self, subject: &str, rules: Option<&RelationRules>) -> Result<Option<Arc<Site>>> {
        match match_subject(subject, rules) {
            Relation::Unconfigured => Ok(None),
            Relation::Unmatched => self.inventory.default_site().await.map(Some),
            Relation::Matched(name) => self.named_site(name).await.map(Some),
        }
    }

    async fn tenant(&self, subject: &str, rules: Option<&RelationRules>) -> Result<Option<Arc<Tenant>>> {
        match match_subject(subject, rules) {
            Relation::Matched(name) => {
                let tenant = Tenant {
                    meta: self.own_meta(),
                    ..Tenant::named(name)
                };
                self.inventory.upsert(tenant).await.map(Some)
            }
            Relation::Unconfigured | Relation::Unmatched => Ok(None),
        }
    }

    async fn role(
        &self,
        subject: &str,
        rules: Option<&RelationRules>,
        fallback: DefaultRole,
    ) -> Result<Arc<DeviceRole>> {
        if let Some(name) = match_subject(subject, rules).matched() {
            let role = DeviceRole {
                meta: self.own_meta(),
                vm_role: Some(fallback != DefaultRole::Server),
                ..DeviceRole::named(name)
            };
            return self.inventory.upsert(role).await;
        }
        match fallback {
            DefaultRole::Server => self.inventory.server_role().await,
            DefaultRole::Vm => self.inventory.vm_role().await,
            DefaultRole::VmTemplate => self.inventory.vm_template_role().await,
        }
    }

    async fn named_site(&self, name: &str) -> Result<Arc<Site>> {
        let site = Site {
            meta: self.own_meta(),
            ..Site::named(name)
        };
        self.inventory.upsert(site).await
    }

    fn own_meta(&self) -> ssot_common::model::Meta {
        ssot_common::model::Meta::tagged([self.inventory.tag().to_string()])
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
