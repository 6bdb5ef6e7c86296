//! VMs phase. Every VM is synced by its own worker.

use std::sync::Arc;

use ssot_common::model::*;
use ssot_common::network::{IpVersion, parse_interface_address};
use ssot_common::utils::{alphanumeric, match_names_with_emails, platform_name, split_emails, split_owners};
use ssot_common::{Result, SsotError};
use ssot_core::enrich::{AddressContext, admit_ip_address, derive_prefix};
use ssot_core::primary::{MacOwner, select_primary, set_primary_ips};
use ssot_core::relations::Resolver;
use ssot_core::{Inventory, SyncContext};
use tracing::{debug, info, warn};

use super::Hypervisor;
use super::snapshot::{HostRecord, VmNicRecord, VmRecord};
use crate::shared::{attach_mac, mode_for_vids};

const MIB: u64 = 1024 * 1024;

/// Targets of the custom-field remapping table with a meaning of their own.
const MAP_OWNER: &str = "owner";
const MAP_EMAIL: &str = "email";
const MAP_DESCRIPTION: &str = "description";

const SEE_COMMENTS: &str = "See comments.";

/// What the custom attributes of a VM turned into.
#[derive(Debug, Default)]
struct VmAttributes {
    owners: Vec<String>,
    emails: Vec<String>,
    description: String,
}

impl Hypervisor {
    pub(super) async fn sync_vms(self: Arc<Self>, ctx: &SyncContext) -> Result<()> {
        let items: Vec<(String, String)> = self
            .snapshot
            .vms
            .iter()
            .map(|(id, vm)| (vm.name.clone(), id.clone()))
            .collect();

        let inventory = Arc::clone(&ctx.inventory);
        let this = Arc::clone(&self);
        let synced = ctx
            .pool
            .run(items, move |vm_id| {
                let this = Arc::clone(&this);
                let inventory = Arc::clone(&inventory);
                async move { this.sync_vm(&inventory, &vm_id).await }
            })
            .await?;

        info!(source = %self.config.name, vms = synced, "vms synced");
        Ok(())
    }

    async fn sync_vm(&self, inventory: &Inventory, vm_id: &str) -> Result<()> {
        let vm = self
            .snapshot
            .vms
            .get(vm_id)
            .ok_or_else(|| SsotError::invalid_record(format!("unknown vm {vm_id}")))?;
        if vm.template && self.config.ignore_vm_templates {
            debug!(vm = %vm.name, "template skipped");
            return Ok(());
        }
        let host = self.snapshot.hosts.get(&vm.host).ok_or_else(|| {
            SsotError::invalid_record(format!("vm {}: unknown host '{}'", vm.name, vm.host))
        })?;

        let resolver = Resolver::new(inventory, &self.config);
        let site = resolver.host_site(&host.name).await?;
        let host_device = inventory.lookup::<Device>(&(host.name.clone(), site.as_ref().map(|s| s.id())));
        let role = resolver.vm_role(&vm.name, vm.template).await?;
        let tenant = resolver.vm_tenant(&vm.name).await?;
        let platform = inventory.upsert(Platform::named(&platform_name(&vm.guest_os, ""))).await?;

        let mut meta = self.meta(inventory, Some(vm_id));
        let attributes = self.map_custom_fields(inventory, vm, &mut meta).await?;

        let (description, comments) =
            if attributes.description.chars().count() > MAX_DESCRIPTION_LENGTH {
                (SEE_COMMENTS.to_string(), attributes.description.clone())
            } else {
                (attributes.description.clone(), String::new())
            };

        let synced = inventory
            .upsert(Vm {
                meta: meta.with_description(description),
                name: vm.name.clone(),
                cluster: host_device.as_ref().and_then(|d| d.cluster),
                site: site.as_ref().map(|s| s.id()),
                tenant: tenant.as_ref().map(|t| t.id()),
                host: host_device.as_ref().map(|d| d.id()),
                platform: Some(platform.id()),
                role: Some(role.id()),
                status: Some(if vm.powered_on { VmStatus::Active } else { VmStatus::Offline }),
                vcpus: vm.vcpus,
                memory: vm.memory_mb,
                comments,
                primary_ipv4: None,
                primary_ipv6: None,
            })
            .await?;

        if vm.template {
            return Ok(());
        }

        self.sync_contacts(inventory, &synced, &attributes).await?;

        let mut ipv4 = Vec::new();
        let mut ipv6 = Vec::new();
        for nic in &vm.nics {
            for ip in self.sync_vm_nic(inventory, &resolver, &synced, host, nic).await? {
                let version = parse_interface_address(&ip.address).map(|net| IpVersion::of(&net.ip()))?;
                match version {
                    IpVersion::V4 => ipv4.push(ip),
                    IpVersion::V6 => ipv6.push(ip),
                }
            }
        }

        let (gateway4, gateway6) = vm.default_gateways();
        let primary4 = select_primary(&ipv4, gateway4.as_deref()).map(|ip| ip.as_ref());
        let primary6 = select_primary(&ipv6, gateway6.as_deref()).map(|ip| ip.as_ref());
        if let Err(err) = set_primary_ips(inventory, &synced, primary4, primary6).await {
            warn!(vm = %vm.name, error = %err, "cannot set primary addresses");
        }

        for disk in &vm.disks {
            inventory
                .upsert(VirtualDisk {
                    meta: self.meta(inventory, None).with_description(disk.summary.as_str()),
                    vm: synced.id(),
                    name: disk.label.clone(),
                    size: disk.capacity_bytes / MIB,
                })
                .await?;
        }
        Ok(())
    }

    /// Applies the remapping table to the VM's custom attributes. Fields that stay custom
    /// fields are registered as definitions first.
    async fn map_custom_fields(&self, inventory: &Inventory, vm: &VmRecord, meta: &mut Meta) -> Result<VmAttributes> {
        let mut attributes = VmAttributes::default();
        for (name, value) in &vm.custom_fields {
            let field = match self.config.custom_field_mappings.get(name) {
                Some(MAP_OWNER) => {
                    attributes.owners.extend(split_owners(value));
                    continue;
                }
                Some(MAP_EMAIL) => {
                    attributes.emails.extend(split_emails(value));
                    continue;
                }
                Some(MAP_DESCRIPTION) => {
                    attributes.description = value.trim().to_string();
                    continue;
                }
                Some(renamed) => alphanumeric(renamed),
                None => alphanumeric(name),
            };
            if field.is_empty() {
                debug!(vm = %vm.name, attribute = %name, "custom attribute without usable name");
                continue;
            }
            if inventory.lookup::<CustomField>(&field).is_none() {
                inventory
                    .upsert(CustomField {
                        meta: self.meta(inventory, None),
                        ..CustomField::text(&field, name, &[ObjectKind::Vm])
                    })
                    .await?;
            }
            meta.custom_fields.insert(field, value.as_str().into());
        }
        Ok(attributes)
    }

    /// Owners become contacts of the VM. Names and addresses are zipped when the lists line
    /// up, matched by name otherwise.
    async fn sync_contacts(&self, inventory: &Inventory, vm: &Vm, attributes: &VmAttributes) -> Result<()> {
        if attributes.owners.is_empty() {
            return Ok(());
        }
        let pairs: Vec<(String, String)> = if attributes.owners.len() == attributes.emails.len() {
            attributes
                .owners
                .iter()
                .cloned()
                .zip(attributes.emails.iter().cloned())
                .collect()
        } else {
            let matched = match_names_with_emails(&attributes.owners, &attributes.emails);
            attributes
                .owners
                .iter()
                .map(|owner| (owner.clone(), matched.get(owner).cloned().unwrap_or_default()))
                .collect()
        };

        let role = inventory.admin_contact_role().await?;
        for (name, email) in pairs {
            let contact = inventory
                .upsert(Contact {
                    meta: self.meta(inventory, None),
                    name,
                    email,
                })
                .await?;
            inventory
                .upsert(ContactAssignment {
                    meta: self.meta(inventory, None),
                    object: vm.assigned(),
                    contact: contact.id(),
                    role: Some(role.id()),
                })
                .await?;
        }
        Ok(())
    }

    /// Syncs one NIC and returns the addresses admitted on it.
    async fn sync_vm_nic(
        &self,
        inventory: &Inventory,
        resolver: &Resolver<'_>,
        vm: &Vm,
        host: &HostRecord,
        nic: &VmNicRecord,
    ) -> Result<Vec<Arc<IpAddress>>> {
        let networks = &self.snapshot.networks;
        let mut network = nic.network.clone().unwrap_or_default();
        let mut vlan_info = String::new();
        let mut mode = None;
        let mut untagged_vlan = None;
        let mut tagged_vlans = Vec::new();
        let mut mtu = 0;

        if let Some(pg) = nic.dv_portgroup.as_ref().and_then(|key| networks.portgroups.get(key)) {
            network = pg.name.clone();
            mode = mode_for_vids(&pg.vlan_ids);
            match (mode, pg.vlan_ids.as_slice()) {
                (Some(InterfaceMode::Access), [vid]) if *vid != 0 => {
                    untagged_vlan = self.find_vlan(resolver, inventory, *vid, &pg.name).await?.map(|v| v.id());
                }
                (Some(InterfaceMode::Tagged), vids) => {
                    for &vid in vids.iter().filter(|vid| **vid != 0) {
                        if let Some(vlan) = self.find_vlan(resolver, inventory, vid, &pg.name).await? {
                            tagged_vlans.push(vlan.id());
                        }
                    }
                }
                _ => {}
            }
            let vids: Vec<String> = pg.vlan_ids.iter().map(u16::to_string).collect();
            vlan_info = format!("vlan ID: {}", vids.join(", "));
            if let Some(switch) = nic.dv_switch.as_ref().and_then(|uuid| networks.host_switch(&host.name, uuid)) {
                mtu = switch.mtu;
            }
        } else if let Some(pg) = nic.network.as_ref().and_then(|name| networks.host_portgroup(&host.name, name)) {
            if pg.vlan_id != 0 {
                mode = Some(InterfaceMode::Access);
                untagged_vlan = self.find_vlan(resolver, inventory, pg.vlan_id, &network).await?.map(|v| v.id());
            }
            vlan_info = format!("vlan ID: {}", pg.vlan_id);
            if let Some(switch) = networks.host_switch(&host.name, &pg.vswitch) {
                mtu = switch.mtu;
            }
        }

        let name = if network.is_empty() {
            nic.short_name()
        } else {
            format!("{} ({network})", nic.short_name())
        };
        if self.config.is_filtered_interface(&name) {
            debug!(vm = %vm.name, interface = %name, "filtered out");
            return Ok(Vec::new());
        }
        let description = if vlan_info.is_empty() {
            nic.label.clone()
        } else {
            format!("{} ({vlan_info})", nic.label)
        };

        let iface = inventory
            .upsert(VmInterface {
                meta: self.meta(inventory, None).with_description(description),
                vm: vm.id(),
                name,
                mtu,
                mode,
                enabled: Some(nic.connected),
                untagged_vlan,
                tagged_vlans,
                primary_mac: None,
            })
            .await?;
        let owner = attach_mac(inventory, MacOwner::VmInterface(iface), &nic.mac).await?;

        let ctx = AddressContext {
            assigned: owner.assigned(),
            meta: self.meta(inventory, None),
            tenant: vm.tenant,
            dns_name: String::new(),
        };
        let mut admitted = Vec::new();
        for address in &nic.addresses {
            if let Err(err) = parse_interface_address(address) {
                warn!(vm = %vm.name, address = %address, error = %err, "unusable guest address");
                continue;
            }
            if let Some(ip) = admit_ip_address(inventory, &self.config, address, &ctx).await {
                derive_prefix(inventory, &ip.address, vm.site, vm.tenant, &self.meta(inventory, None)).await;
                admitted.push(ip);
            }
        }
        Ok(admitted)
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
    use crate::hypervisor::HypervisorSource;
    use pretty_assertions::assert_eq;
    use ssot_common::SsotError;
    use ssot_common::config::{InterfaceFilter, SourceConfig, SourceType};
    use ssot_common::model::*;
    use ssot_core::{Inventory, MemoryTarget, Phase, SyncOrchestrator};
    use std::sync::Arc;

    const SNAPSHOT: &str = r#"{
        "clusters": { "c-1": { "name": "prod" } },
        "hosts": {
            "host-1": { "name": "esx01", "cluster": "c-1", "connection_state": "connected" }
        },
        "vms": {
            "vm-1": {
                "name": "web01",
                "host": "host-1",
                "powered_on": true,
                "guest_os": "Ubuntu Linux (64-bit)",
                "vcpus": 2,
                "memory_mb": 4096,
                "custom_fields": {
                    "Owner": "John Doe",
                    "Mail": "nobody@example.com, john.doe@example.com",
                    "Cost Center": "42"
                },
                "nics": [
                    {
                        "label": "Network adapter 1",
                        "mac": "00:50:56:aa:bb:01",
                        "connected": true,
                        "network": "VM Network",
                        "addresses": ["10.0.0.5/24", "10.0.1.5/24", "192.168.50.5/24"]
                    },
                    { "label": "Network adapter 2", "mac": "00:50:56:aa:bb:02", "network": "docker" }
                ],
                "disks": [{ "label": "Hard disk 1", "summary": "40 GB", "capacity_bytes": 42949672960 }],
                "routes": [{ "network": "0.0.0.0", "prefix_length": 0, "gateway": "10.0.1.1" }]
            },
            "vm-2": { "name": "golden", "host": "host-1", "template": true },
            "vm-3": {
                "name": "notes",
                "host": "NOTES_HOST",
                "custom_fields": { "Notes": "NOTES_PLACEHOLDER" }
            }
        }
    }"#;

    fn config() -> SourceConfig {
        let mut config = SourceConfig::new("vc", SourceType::Hypervisor);
        config.ignore_vm_templates = true;
        config.interface_filter = Some(InterfaceFilter::new("docker").unwrap());
        config.permitted_subnets = vec!["10.0.0.0/8".to_string()].try_into().unwrap();
        config.custom_field_mappings = vec![
            "Owner = owner".to_string(),
            "Mail = email".to_string(),
            "Notes = description".to_string(),
        ]
        .try_into()
        .unwrap();
        config
    }

    async fn sync(snapshot: &str) -> (Arc<Inventory>, Result<(), SsotError>) {
        let inventory = Arc::new(Inventory::new(Arc::new(MemoryTarget::new()), "ssot"));
        let orchestrator = SyncOrchestrator::new(Arc::clone(&inventory), 4);
        let source = HypervisorSource::from_json(config(), snapshot).unwrap();
        for phase in [Phase::Clusters, Phase::Hosts] {
            orchestrator.run_phase(&source, phase).await.unwrap();
        }
        let result = orchestrator.run_phase(&source, Phase::Vms).await;
        (inventory, result)
    }

    fn snapshot_with(notes_host: &str) -> String {
        SNAPSHOT
            .replace("NOTES_PLACEHOLDER", &"x".repeat(250))
            .replace("NOTES_HOST", notes_host)
    }

    fn snapshot() -> String {
        snapshot_with("host-1")
    }

    fn vm(inv: &Inventory, name: &str) -> Arc<Vm> {
        inv.all::<Vm>().into_iter().find(|vm| vm.name == name).unwrap()
    }

    #[tokio::test]
    async fn vm_joins_host_cluster_and_picks_gateway_address() {
        let (inv, result) = sync(&snapshot()).await;
        result.unwrap();

        let web = vm(&inv, "web01");
        let host = inv.all::<Device>().pop().unwrap();
        assert_eq!(web.cluster, host.cluster);
        assert_eq!(web.host, Some(host.id()));
        assert_eq!(web.status, Some(VmStatus::Active));

        let ifaces = inv.all::<VmInterface>();
        assert_eq!(ifaces.len(), 1);
        assert_eq!(ifaces[0].name, "vNIC 1 (VM Network)");
        assert!(ifaces[0].primary_mac.is_some());

        let primary = inv.lookup::<IpAddress>(&"10.0.1.5/24".to_string()).unwrap();
        assert_eq!(web.primary_ipv4, Some(primary.id()));
        assert!(inv.lookup::<IpAddress>(&"192.168.50.5/24".to_string()).is_none());
        assert!(inv.lookup::<Prefix>(&"10.0.0.0/24".to_string()).is_some());

        let disk = inv.all::<VirtualDisk>().pop().unwrap();
        assert_eq!(disk.size, 40 * 1024);
    }

    #[tokio::test]
    async fn unparsable_guest_address_is_skipped() {
        let (inv, result) = sync(&snapshot().replace("192.168.50.5/24", "garbage")).await;
        result.unwrap();

        let web = vm(&inv, "web01");
        assert_eq!(web.vcpus, 2);
        assert_eq!(web.memory, 4096);
        assert!(inv.lookup::<IpAddress>(&"10.0.0.5/24".to_string()).is_some());
        assert!(inv.lookup::<IpAddress>(&"garbage".to_string()).is_none());
        assert_eq!(
            web.primary_ipv4,
            inv.lookup::<IpAddress>(&"10.0.1.5/24".to_string()).map(|ip| ip.id())
        );
    }

    #[tokio::test]
    async fn owners_are_matched_to_addresses_by_name() {
        let (inv, result) = sync(&snapshot()).await;
        result.unwrap();

        let contact = inv.lookup::<Contact>(&"John Doe".to_string()).unwrap();
        assert_eq!(contact.email, "john.doe@example.com");
        let assignment = inv.all::<ContactAssignment>().pop().unwrap();
        assert_eq!(assignment.object, vm(&inv, "web01").assigned());
        assert_eq!(assignment.contact, contact.id());
    }

    #[tokio::test]
    async fn unmapped_attributes_become_custom_fields() {
        let (inv, result) = sync(&snapshot()).await;
        result.unwrap();

        let field = inv.lookup::<CustomField>(&"CostCenter".to_string()).unwrap();
        assert_eq!(field.label, "Cost Center");
        assert_eq!(field.object_types, vec![ObjectKind::Vm]);
        assert_eq!(vm(&inv, "web01").meta.custom_fields["CostCenter"], "42");
    }

    #[tokio::test]
    async fn templates_are_skipped_and_long_descriptions_move_to_comments() {
        let (inv, result) = sync(&snapshot()).await;
        result.unwrap();

        assert!(inv.all::<Vm>().iter().all(|vm| vm.name != "golden"));
        let notes = vm(&inv, "notes");
        assert_eq!(notes.meta.description, "See comments.");
        assert_eq!(notes.comments.len(), 250);
    }

    #[tokio::test]
    async fn unknown_host_fails_only_that_vm() {
        let (inv, result) = sync(&snapshot_with("host-9")).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("1 of 3 workers failed"));
        assert!(inv.all::<Vm>().iter().any(|vm| vm.name == "web01"));
    }
}
