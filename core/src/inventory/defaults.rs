//! Objects the inventory falls back to when relation rules resolve to nothing.

use std::sync::Arc;

use ssot_common::Result;
use ssot_common::model::*;
use tracing::info;

use super::Inventory;

pub const DEFAULT_SITE: &str = "Default";
pub const DEFAULT_VLAN_GROUP: &str = "Default VLAN group";
pub const SERVER_ROLE: &str = "Server";
pub const VM_ROLE: &str = "VM";
pub const VM_TEMPLATE_ROLE: &str = "VM Template";
pub const ADMIN_CONTACT_ROLE: &str = "Admin";

impl Inventory {
    fn own_meta(&self) -> Meta {
        Meta::tagged([self.tag.clone()])
    }

    /// Registers everything sources expect to exist before their first phase.
    pub async fn bootstrap(&self, source_tags: &[(String, String)]) -> Result<()> {
        self.ensure_tag(&self.tag, COLOR_GREY).await?;
        for (name, color) in source_tags {
            self.ensure_tag(name, color).await?;
        }

        self.default_site().await?;
        self.server_role().await?;
        self.vm_role().await?;
        self.vm_template_role().await?;
        self.admin_contact_role().await?;

        let hosts_and_vms = [ObjectKind::Device, ObjectKind::Vm];
        let fields = [
            CustomField::text(CF_SOURCE, "Source", &ObjectKind::ALL),
            CustomField::text(CF_SOURCE_ID, "Source ID", &ObjectKind::ALL),
            CustomField::text(CF_UUID, "UUID", &hosts_and_vms),
            CustomField::text(CF_HOST_CPU_CORES, "Host CPU cores", &[ObjectKind::Device]),
            CustomField::text(CF_HOST_MEMORY, "Host memory", &[ObjectKind::Device]),
            CustomField {
                field_type: CustomFieldType::Boolean,
                ..CustomField::text(CF_ARP_ENTRY, "ARP entry", &[ObjectKind::IpAddress])
            },
        ];
        for mut field in fields {
            field.meta = self.own_meta();
            self.upsert(field).await?;
        }

        info!(tag = %self.tag, "inventory defaults registered");
        Ok(())
    }

    pub async fn ensure_tag(&self, name: &str, color: &str) -> Result<Arc<Tag>> {
        self.upsert(Tag::new(name, color)).await
    }

    pub async fn default_site(&self) -> Result<Arc<Site>> {
        self.upsert(Site {
            meta: self.own_meta(),
            ..Site::named(DEFAULT_SITE)
        })
        .await
    }

    pub async fn server_role(&self) -> Result<Arc<DeviceRole>> {
        self.role(SERVER_ROLE, "00add8", false).await
    }

    pub async fn vm_role(&self) -> Result<Arc<DeviceRole>> {
        self.role(VM_ROLE, COLOR_BLUE, true).await
    }

    pub async fn vm_template_role(&self) -> Result<Arc<DeviceRole>> {
        self.role(VM_TEMPLATE_ROLE, COLOR_GREY, true).await
    }

    async fn role(&self, name: &str, color: &str, vm_role: bool) -> Result<Arc<DeviceRole>> {
        self.upsert(DeviceRole {
            meta: self.own_meta(),
            color: color.to_string(),
            vm_role: Some(vm_role),
            ..DeviceRole::named(name)
        })
        .await
    }

    pub async fn admin_contact_role(&self) -> Result<Arc<ContactRole>> {
        self.upsert(ContactRole {
            meta: self.own_meta(),
            ..ContactRole::named(ADMIN_CONTACT_ROLE)
        })
        .await
    }

    /// VLAN group used when no grouping rule applies: one per site, scoped to it, or a global
    /// group for VLANs without a site. Covers the full VID range.
    pub async fn default_vlan_group_for_site(&self, site: Option<&Site>) -> Result<Arc<VlanGroup>> {
        let group = match site {
            Some(site) => VlanGroup {
                meta: self.own_meta(),
                scope: Some(site.assigned()),
                ..VlanGroup::named(&format!("{} VLAN group", site.name))
            },
            None => VlanGroup {
                meta: self.own_meta(),
                ..VlanGroup::named(DEFAULT_VLAN_GROUP)
            },
        };
        self.upsert(group).await
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
    use crate::target::MemoryTarget;

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let target = Arc::new(MemoryTarget::new());
        let inv = Inventory::new(target.clone(), "ssot");
        let tags = vec![("vcenter".to_string(), COLOR_GREEN.to_string())];

        inv.bootstrap(&tags).await.unwrap();
        let created = target.total_creates();
        inv.bootstrap(&tags).await.unwrap();

        assert_eq!(target.total_creates(), created);
        assert_eq!(target.total_updates(), 0);
        assert_eq!(inv.count::<Tag>(), 2);
        assert_eq!(inv.count::<DeviceRole>(), 3);
        assert_eq!(inv.count::<CustomField>(), 6);
        assert!(inv.lookup::<Site>(&DEFAULT_SITE.to_string()).is_some());
    }

    #[tokio::test]
    async fn default_vlan_group_is_scoped_to_site() {
        let inv = Inventory::new(Arc::new(MemoryTarget::new()), "ssot");
        let site = inv.upsert(Site::named("Ljubljana")).await.unwrap();

        let scoped = inv.default_vlan_group_for_site(Some(&*site)).await.unwrap();
        let global = inv.default_vlan_group_for_site(None).await.unwrap();

        assert_eq!(scoped.name, "Ljubljana VLAN group");
        assert_eq!(scoped.scope, Some(site.assigned()));
        assert_eq!((scoped.min_vid, scoped.max_vid), (1, 4094));
        assert_eq!(global.name, DEFAULT_VLAN_GROUP);
        assert_eq!(global.scope, None);
    }
}
