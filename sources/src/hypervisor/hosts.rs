//! Hosts phase: devices, their physical and VMkernel NICs and the host's primary address.

use std::sync::Arc;

use ssot_common::model::*;
use ssot_common::utils::{device_type_slug, manufacturer_name, platform_name};
use ssot_common::Result;
use ssot_core::Inventory;
use ssot_core::enrich::{AddressContext, admit_ip_address, derive_prefix};
use ssot_core::primary::{MacOwner, select_host_primary, set_primary_ips};
use ssot_core::relations::Resolver;
use tracing::{debug, warn};

use super::Hypervisor;
use super::snapshot::{HostRecord, PnicRecord, VnicRecord};
use crate::shared::{attach_mac, mode_for_vids, with_netmask};

const UNKNOWN: &str = "Unknown";

/// Addresses collected over all interfaces of one host.
#[derive(Default)]
struct HostAddresses {
    ipv4: Vec<Arc<IpAddress>>,
    ipv6: Vec<Arc<IpAddress>>,
}

impl Hypervisor {
    pub(super) async fn sync_hosts(&self, inventory: &Inventory) -> Result<()> {
        for (host_id, host) in &self.snapshot.hosts {
            let device = self.sync_host(inventory, host_id, host).await?;
            debug!(host = %device.name, id = %device.id(), "host synced");
        }
        Ok(())
    }

    async fn sync_host(&self, inventory: &Inventory, host_id: &str, host: &HostRecord) -> Result<Arc<Device>> {
        let resolver = Resolver::new(inventory, &self.config);
        let site = resolver.host_site(&host.name).await?;
        let tenant = resolver.host_tenant(&host.name).await?;

        let cluster = match host
            .cluster
            .as_ref()
            .and_then(|id| self.snapshot.clusters.get(id))
            .and_then(|c| inventory.lookup::<Cluster>(&c.name))
        {
            Some(cluster) => cluster,
            None => self.hypothetical_cluster(inventory, host, site.as_deref(), tenant.as_deref()).await?,
        };

        let vendor = if host.vendor.trim().is_empty() {
            UNKNOWN.to_string()
        } else {
            manufacturer_name(&host.vendor)
        };
        let model = if host.model.trim().is_empty() { UNKNOWN } else { host.model.trim() };
        let manufacturer = inventory.upsert(Manufacturer::named(&vendor)).await?;
        let device_type = inventory
            .upsert(DeviceType {
                meta: Meta::default(),
                manufacturer: manufacturer.id(),
                model: model.to_string(),
                slug: device_type_slug(&vendor, model),
            })
            .await?;
        let platform = inventory
            .upsert(Platform::named(&platform_name(&host.product_name, &host.product_version)))
            .await?;
        let role = resolver.host_role(&host.name).await?;

        let serial = match (self.config.ignore_serial_numbers, host.serial_number()) {
            (false, Some(serial)) => serial.to_string(),
            _ => String::new(),
        };
        let asset_tag = match (self.config.ignore_asset_tags, host.asset_tag()) {
            (false, Some(tag)) => tag.to_string(),
            _ => String::new(),
        };
        let status = if host.is_connected() {
            DeviceStatus::Active
        } else {
            DeviceStatus::Offline
        };

        let meta = self
            .meta(inventory, Some(host_id))
            .with_field(CF_UUID, host.uuid.as_str())
            .with_field(CF_HOST_CPU_CORES, host.cpu_cores.to_string())
            .with_field(CF_HOST_MEMORY, format!("{} GB", host.memory_gb()));

        let device = inventory
            .upsert(Device {
                meta,
                name: host.name.clone(),
                site: site.as_ref().map(|s| s.id()),
                device_type: Some(device_type.id()),
                role: Some(role.id()),
                platform: Some(platform.id()),
                tenant: tenant.as_ref().map(|t| t.id()),
                cluster: Some(cluster.id()),
                status: Some(status),
                serial,
                asset_tag,
                comments: String::new(),
                primary_ipv4: None,
                primary_ipv6: None,
            })
            .await?;

        for pnic in &host.pnics {
            self.sync_physical_nic(inventory, &resolver, &device, host, pnic).await?;
        }
        let mut addresses = HostAddresses::default();
        for vnic in &host.vnics {
            self.sync_virtual_nic(inventory, &resolver, &device, host, vnic, &mut addresses)
                .await?;
        }

        let ipv4 = select_host_primary(&addresses.ipv4, host.address).map(|ip| ip.as_ref());
        let ipv6 = select_host_primary(&addresses.ipv6, host.address).map(|ip| ip.as_ref());
        set_primary_ips(inventory, &device, ipv4, ipv6).await
    }

    /// Cluster for a host that belongs to none, named after the host.
    async fn hypothetical_cluster(
        &self,
        inventory: &Inventory,
        host: &HostRecord,
        site: Option<&Site>,
        tenant: Option<&Tenant>,
    ) -> Result<Arc<Cluster>> {
        let cluster_type = self.cluster_type(inventory).await?;
        inventory
            .upsert(Cluster {
                meta: self.meta(inventory, None),
                name: host.name.clone(),
                cluster_type: cluster_type.id(),
                group: None,
                status: Some(ClusterStatus::Active),
                scope: site.map(|s| s.assigned()),
                tenant: tenant.map(|t| t.id()),
            })
            .await
    }

    /// Name of the VLAN `vid`: the distributed port group carrying only that VLAN names it,
    /// otherwise `portgroup` does.
    pub(super) fn vlan_name(&self, vid: u16, portgroup: &str) -> String {
        let name = self.vid_names.get(&vid).map(String::as_str).unwrap_or(portgroup);
        vlan_display_name(vid, name)
    }

    /// VLAN registered for `vid` in the group its name resolves to.
    pub(super) async fn find_vlan(
        &self,
        resolver: &Resolver<'_>,
        inventory: &Inventory,
        vid: u16,
        portgroup: &str,
    ) -> Result<Option<Arc<Vlan>>> {
        let name = self.vlan_name(vid, portgroup);
        let site = resolver.vlan_site(&name).await?;
        let group = resolver.vlan_group(&name, site.as_deref()).await?;
        Ok(inventory.lookup::<Vlan>(&(Some(group.id()), vid)))
    }

    /// Finds or registers the VLAN `vid` as carried by a standard port group.
    async fn portgroup_vlan(
        &self,
        resolver: &Resolver<'_>,
        inventory: &Inventory,
        portgroup: &str,
        vid: u16,
    ) -> Result<Arc<Vlan>> {
        if let Some(vlan) = self.find_vlan(resolver, inventory, vid, portgroup).await? {
            return Ok(vlan);
        }
        let name = self.vlan_name(vid, portgroup);
        let site = resolver.vlan_site(&name).await?;
        let group = resolver.vlan_group(&name, site.as_deref()).await?;
        let tenant = resolver.vlan_tenant(&name).await?;
        inventory
            .upsert(Vlan {
                meta: self.meta(inventory, None),
                group: Some(group.id()),
                vid,
                name,
                status: Some(VlanStatus::Active),
                site: site.map(|s| s.id()),
                tenant: tenant.map(|t| t.id()),
            })
            .await
    }

    async fn sync_physical_nic(
        &self,
        inventory: &Inventory,
        resolver: &Resolver<'_>,
        device: &Device,
        host: &HostRecord,
        pnic: &PnicRecord,
    ) -> Result<()> {
        if self.config.is_filtered_interface(&pnic.device) {
            debug!(interface = %pnic.device, "filtered out");
            return Ok(());
        }

        let mut description = if pnic.speed_mb >= 1000 {
            format!("{}GB/s pNIC", pnic.speed_mb / 1000)
        } else {
            format!("{}MB/s pNIC", pnic.speed_mb)
        };
        let mut mtu = 0;
        let mut mode = None;
        for (switch_name, switch) in self.snapshot.networks.host_switches.get(&host.name).into_iter().flatten() {
            if !switch.pnics.contains(&pnic.key) {
                continue;
            }
            let label = if switch.name.is_empty() { switch_name } else { &switch.name };
            description = format!("{description} ({label})");
            mtu = switch.mtu;
            if switch.proxy {
                mode = Some(InterfaceMode::TaggedAll);
            }
        }

        let mut vids: Vec<u16> = Vec::new();
        let mut tagged = Vec::new();
        for (pg_name, pg) in self.snapshot.networks.host_portgroups.get(&host.name).into_iter().flatten() {
            if !pg.nics.contains(&pnic.device) || vids.contains(&pg.vlan_id) {
                continue;
            }
            vids.push(pg.vlan_id);
            if pg.vlan_id != 0 && pg.vlan_id <= MAX_VID {
                tagged.push(self.portgroup_vlan(resolver, inventory, pg_name, pg.vlan_id).await?.id());
            }
        }
        vids.sort_unstable();
        if let Some(by_vids) = mode_for_vids(&vids) {
            mode = Some(by_vids);
        }
        if mode != Some(InterfaceMode::Tagged) {
            tagged.clear();
        }

        let speed = u64::from(pnic.speed_mb) * 1000;
        let iface = inventory
            .upsert(Interface {
                meta: self.meta(inventory, None).with_description(description),
                device: device.id(),
                name: pnic.device.clone(),
                interface_type: Some(InterfaceType::from_speed_kbps(speed)),
                speed,
                mtu,
                mode,
                enabled: Some(true),
                untagged_vlan: None,
                tagged_vlans: tagged,
                primary_mac: None,
            })
            .await?;
        attach_mac(inventory, MacOwner::Interface(iface), &pnic.mac).await?;
        Ok(())
    }

    async fn sync_virtual_nic(
        &self,
        inventory: &Inventory,
        resolver: &Resolver<'_>,
        device: &Device,
        host: &HostRecord,
        vnic: &VnicRecord,
        addresses: &mut HostAddresses,
    ) -> Result<()> {
        if self.config.is_filtered_interface(&vnic.device) {
            debug!(interface = %vnic.device, "filtered out");
            return Ok(());
        }

        let networks = &self.snapshot.networks;
        let mut description = String::new();
        let mut mode = None;
        let mut untagged_vlan = None;
        let mut tagged_vlans = Vec::new();

        if let Some(pg) = networks.host_portgroup(&host.name, &vnic.portgroup) {
            description = format!("{} ({}, vlan ID: {})", vnic.portgroup, pg.vswitch, pg.vlan_id);
            if pg.vlan_id != 0 {
                mode = Some(InterfaceMode::Access);
                untagged_vlan = self.find_vlan(resolver, inventory, pg.vlan_id, &vnic.portgroup).await?.map(|v| v.id());
            }
        } else if let Some(pg) = vnic.dv_portgroup.as_ref().and_then(|key| networks.portgroups.get(key)) {
            description = pg.name.clone();
            mode = mode_for_vids(&pg.vlan_ids);
            if mode == Some(InterfaceMode::Tagged) {
                for &vid in pg.vlan_ids.iter().filter(|vid| **vid != 0) {
                    if let Some(vlan) = self.find_vlan(resolver, inventory, vid, &pg.name).await? {
                        tagged_vlans.push(vlan.id());
                    }
                }
            }
            if let Some(switch) = vnic
                .dv_switch
                .as_ref()
                .and_then(|uuid| networks.host_switch(&host.name, uuid))
            {
                description = format!("{description} ({})", switch.name);
            }
        }

        let iface = inventory
            .upsert(Interface {
                meta: self.meta(inventory, None).with_description(description),
                device: device.id(),
                name: vnic.device.clone(),
                interface_type: Some(InterfaceType::Virtual),
                speed: 0,
                mtu: vnic.mtu,
                mode,
                enabled: Some(true),
                untagged_vlan,
                tagged_vlans,
                primary_mac: None,
            })
            .await?;
        let iface = match attach_mac(inventory, MacOwner::Interface(iface), &vnic.mac).await? {
            MacOwner::Interface(iface) => iface,
            MacOwner::VmInterface(_) => return Ok(()),
        };

        let ctx = AddressContext {
            assigned: iface.assigned(),
            meta: self.meta(inventory, None).with_field(CF_ARP_ENTRY, false),
            tenant: device.tenant,
            dns_name: String::new(),
        };

        if let (Some(ip), Some(mask)) = (vnic.ipv4.as_deref(), vnic.netmask.as_deref()) {
            match with_netmask(ip, mask) {
                Ok(address) => {
                    if let Some(ip) = admit_ip_address(inventory, &self.config, &address, &ctx).await {
                        derive_prefix(inventory, &ip.address, None, None, &self.meta(inventory, None)).await;
                        addresses.ipv4.push(ip);
                    }
                }
                Err(err) => warn!(interface = %vnic.device, error = %err, "skipping ipv4 address"),
            }
        }
        for entry in &vnic.ipv6 {
            let address = format!("{}/{}", entry.address, entry.prefix_length);
            if let Some(ip) = admit_ip_address(inventory, &self.config, &address, &ctx).await {
                derive_prefix(inventory, &ip.address, None, None, &self.meta(inventory, None)).await;
                addresses.ipv6.push(ip);
            }
        }
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
