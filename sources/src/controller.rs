//! # Controller Source
//!
//! Syncs a DNA-Center-like snapshot:
//! `sites -> vlans -> devices -> interfaces -> wireless_lans -> missing_primary_ips`.
//!
//! Controller IDs are mapped to published objects in [`IdMap`]s as the phases go, so later
//! phases (and the device workers) never search the inventory by name.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use ssot_common::config::SourceConfig;
use ssot_common::matcher::match_subject;
use ssot_common::model::*;
use ssot_common::network::{is_permitted, parse_interface_address};
use ssot_common::utils::{device_type_slug, platform_name};
use ssot_common::{Result, SsotError};
use ssot_core::enrich::{AddressContext, admit_ip_address, derive_prefix};
use ssot_core::primary::{MacOwner, set_primary_ips};
use ssot_core::relations::Resolver;
use ssot_core::{IdMap, Inventory, Phase, Source, SyncContext};
use tracing::{debug, info, warn};

pub mod snapshot;

pub use snapshot::ControllerSnapshot;
use snapshot::{DeviceRecord, InterfaceRecord, SiteKind};

use crate::shared::{attach_mac, source_meta, with_netmask};

pub(crate) const PHASES: &[Phase] = &[
    Phase::Sites,
    Phase::Vlans,
    Phase::Devices,
    Phase::Interfaces,
    Phase::WirelessLans,
    Phase::MissingPrimaryIps,
];

pub const MANUFACTURER: &str = "Cisco";
pub const MANAGEMENT_INTERFACE: &str = "Management";

pub struct ControllerSource {
    inner: Arc<Controller>,
}

struct Controller {
    config: SourceConfig,
    snapshot: ControllerSnapshot,
    /// Controller site ID -> site (floors map to their building).
    site_ids: IdMap<String, Arc<Site>>,
    vlans: IdMap<u16, Arc<Vlan>>,
    devices: IdMap<String, Arc<Device>>,
    /// Device ID -> management address, for devices without a primary IPv4.
    missing: IdMap<String, String>,
}

impl ControllerSource {
    pub fn new(config: SourceConfig, snapshot: ControllerSnapshot) -> Self {
        Self {
            inner: Arc::new(Controller {
                config,
                snapshot,
                site_ids: IdMap::new(),
                vlans: IdMap::new(),
                devices: IdMap::new(),
                missing: IdMap::new(),
            }),
        }
    }

    pub fn from_json(config: SourceConfig, text: &str) -> Result<Self> {
        let snapshot: ControllerSnapshot = serde_json::from_str(text)?;
        debug!(
            source = %config.name,
            sites = snapshot.sites.len(),
            devices = snapshot.devices.len(),
            "controller snapshot loaded"
        );
        Ok(Self::new(config, snapshot))
    }
}

#[async_trait]
impl Source for ControllerSource {
    fn name(&self) -> &str {
        &self.inner.config.name
    }

    fn phases(&self) -> &'static [Phase] {
        PHASES
    }

    async fn run_phase(&self, phase: Phase, ctx: &SyncContext) -> Result<()> {
        let inventory = ctx.inventory.as_ref();
        match phase {
            Phase::Sites => self.inner.sync_sites(inventory).await,
            Phase::Vlans => self.inner.sync_vlans(inventory).await,
            Phase::Devices => Controller::sync_devices(Arc::clone(&self.inner), ctx).await,
            Phase::Interfaces => self.inner.sync_interfaces(inventory).await,
            Phase::WirelessLans => self.inner.sync_wireless_lans(inventory).await,
            Phase::MissingPrimaryIps => self.inner.sync_missing_primary_ips(inventory).await,
            other => Err(SsotError::Config(format!("controller sources have no {other} phase"))),
        }
    }
}

impl Controller {
    fn meta(&self, inventory: &Inventory, object_id: Option<&str>) -> Meta {
        source_meta(inventory, &self.config, object_id)
    }

    async fn sync_sites(&self, inventory: &Inventory) -> Result<()> {
        let buildings = self
            .snapshot
            .sites
            .iter()
            .filter(|(_, site)| site.kind == SiteKind::Building);
        for (site_id, building) in buildings {
            let site = inventory
                .upsert(Site {
                    meta: self.meta(inventory, Some(site_id)),
                    physical_address: building.address.clone(),
                    latitude: building.latitude,
                    longitude: building.longitude,
                    ..Site::named(&building.name)
                })
                .await?;
            self.site_ids.insert(site_id.clone(), site);
        }

        for (site_id, record) in &self.snapshot.sites {
            if record.kind == SiteKind::Building {
                continue;
            }
            match self
                .snapshot
                .building_of(site_id)
                .and_then(|building| self.site_ids.get(&building.to_string()))
            {
                Some(site) => {
                    self.site_ids.insert(site_id.clone(), site);
                }
                None => debug!(site = %record.name, "no building above site"),
            }
        }
        info!(source = %self.config.name, sites = self.site_ids.len(), "sites mapped");
        Ok(())
    }

    async fn sync_vlans(&self, inventory: &Inventory) -> Result<()> {
        let resolver = Resolver::new(inventory, &self.config);
        for (&vid, record) in &self.snapshot.vlans {
            if vid == 0 || vid > MAX_VID {
                debug!(vid, "vlan id out of range");
                continue;
            }
            let name = if record.name.is_empty() {
                format!("VLAN{vid:04}")
            } else {
                vlan_display_name(vid, &record.name)
            };
            let site = resolver.vlan_site(&name).await?;
            let group = resolver.vlan_group(&name, site.as_deref()).await?;
            let tenant = resolver.vlan_tenant(&name).await?;
            let vlan = inventory
                .upsert(Vlan {
                    meta: self.meta(inventory, None),
                    group: Some(group.id()),
                    vid,
                    name,
                    status: Some(VlanStatus::Active),
                    site: site.map(|s| s.id()),
                    tenant: tenant.map(|t| t.id()),
                })
                .await?;
            self.vlans.insert(vid, vlan);
        }
        Ok(())
    }

    async fn sync_devices(self: Arc<Self>, ctx: &SyncContext) -> Result<()> {
        let items: Vec<(String, String)> = self
            .snapshot
            .devices
            .iter()
            .map(|(id, device)| (device.hostname.clone(), id.clone()))
            .collect();

        let inventory = Arc::clone(&ctx.inventory);
        let this = Arc::clone(&self);
        let synced = ctx
            .pool
            .run(items, move |device_id| {
                let this = Arc::clone(&this);
                let inventory = Arc::clone(&inventory);
                async move { this.sync_device(&inventory, &device_id).await }
            })
            .await?;

        info!(source = %self.config.name, devices = synced, "devices synced");
        Ok(())
    }

    async fn sync_device(&self, inventory: &Inventory, device_id: &str) -> Result<()> {
        let record = self
            .snapshot
            .devices
            .get(device_id)
            .ok_or_else(|| SsotError::invalid_record(format!("unknown device {device_id}")))?;
        if record.hostname.trim().is_empty() {
            return Err(SsotError::invalid_record(format!("device {device_id} has no hostname")));
        }

        let site = match record.site.as_ref().and_then(|id| self.site_ids.get(id)) {
            Some(site) => site,
            None => inventory.default_site().await?,
        };
        let tenant = Resolver::new(inventory, &self.config).host_tenant(&record.hostname).await?;

        let manufacturer = inventory.upsert(Manufacturer::named(MANUFACTURER)).await?;
        let model = if record.platform_id.trim().is_empty() {
            "Unknown"
        } else {
            record.platform_id.trim()
        };
        let device_type = inventory
            .upsert(DeviceType {
                meta: Meta::default(),
                manufacturer: manufacturer.id(),
                model: model.to_string(),
                slug: device_type_slug(MANUFACTURER, model),
            })
            .await?;
        let platform = inventory
            .upsert(Platform {
                manufacturer: Some(manufacturer.id()),
                ..Platform::named(&platform_name(&record.software_type, &record.software_version))
            })
            .await?;
        let role = self.device_role(inventory, record).await?;

        let serial = if self.config.ignore_serial_numbers {
            String::new()
        } else {
            record.serial.trim().to_string()
        };
        let device = inventory
            .upsert(Device {
                meta: self.meta(inventory, Some(device_id)),
                name: record.hostname.clone(),
                site: Some(site.id()),
                device_type: Some(device_type.id()),
                role: Some(role.id()),
                platform: Some(platform.id()),
                tenant: tenant.map(|t| t.id()),
                cluster: None,
                status: Some(if record.reachable {
                    DeviceStatus::Active
                } else {
                    DeviceStatus::Offline
                }),
                serial,
                asset_tag: String::new(),
                comments: String::new(),
                primary_ipv4: None,
                primary_ipv6: None,
            })
            .await?;
        self.devices.insert(device_id.to_string(), device);
        Ok(())
    }

    /// Role from the host role rules, else the device family, else `Server`.
    async fn device_role(&self, inventory: &Inventory, record: &DeviceRecord) -> Result<Arc<DeviceRole>> {
        let name = match match_subject(&record.hostname, self.config.host_role_relations.as_ref()).matched() {
            Some(role) => role,
            None if !record.family.trim().is_empty() => record.family.trim(),
            None => return inventory.server_role().await,
        };
        inventory
            .upsert(DeviceRole {
                meta: Meta::tagged([inventory.tag()]),
                vm_role: Some(false),
                ..DeviceRole::named(name)
            })
            .await
    }

    async fn sync_interfaces(&self, inventory: &Inventory) -> Result<()> {
        for (iface_id, record) in &self.snapshot.interfaces {
            let Some(device) = self.devices.get(&record.device) else {
                warn!(interface = %iface_id, device = %record.device, "interface of unknown device");
                continue;
            };
            if self.config.is_filtered_interface(&record.name) {
                debug!(device = %device.name, interface = %record.name, "filtered out");
                continue;
            }
            self.sync_interface(inventory, &device, iface_id, record).await?;
        }

        for device_id in self.devices.keys() {
            let (Some(device), Some(record)) = (self.devices.get(&device_id), self.snapshot.devices.get(&device_id))
            else {
                continue;
            };
            match (&record.management_address, device.primary_ipv4) {
                (Some(address), None) if !address.trim().is_empty() => {
                    self.missing.insert(device_id, address.trim().to_string());
                }
                _ => {}
            }
        }
        if !self.missing.is_empty() {
            info!(source = %self.config.name, devices = self.missing.len(), "devices without primary address");
        }
        Ok(())
    }

    async fn sync_interface(
        &self,
        inventory: &Inventory,
        device: &Device,
        iface_id: &str,
        record: &InterfaceRecord,
    ) -> Result<()> {
        let vlan = record.vlan.and_then(|vid| self.vlans.get(&vid));
        let (mode, untagged_vlan) = match record.port_mode.as_str() {
            "access" => (Some(InterfaceMode::Access), vlan.map(|v| v.id())),
            "trunk" => (Some(InterfaceMode::TaggedAll), vlan.map(|v| v.id())),
            _ => (None, None),
        };
        let interface_type = if record.speed_kbps == 0 {
            InterfaceType::Virtual
        } else {
            InterfaceType::from_speed_kbps(record.speed_kbps)
        };

        let iface = inventory
            .upsert(Interface {
                meta: self
                    .meta(inventory, Some(iface_id))
                    .with_description(record.description.trim()),
                device: device.id(),
                name: record.name.clone(),
                interface_type: Some(interface_type),
                speed: record.speed_kbps,
                mtu: record.mtu,
                mode,
                enabled: Some(record.admin_up),
                untagged_vlan,
                tagged_vlans: Vec::new(),
                primary_mac: None,
            })
            .await?;
        let owner = attach_mac(inventory, MacOwner::Interface(iface), &record.mac).await?;

        let (Some(ip), Some(mask)) = (record.ipv4.as_deref(), record.netmask.as_deref()) else {
            return Ok(());
        };
        let address = match with_netmask(ip, mask) {
            Ok(address) => address,
            Err(err) => {
                warn!(device = %device.name, interface = %record.name, error = %err, "skipping ipv4 address");
                return Ok(());
            }
        };
        let ctx = AddressContext {
            assigned: owner.assigned(),
            meta: self.meta(inventory, None),
            tenant: device.tenant,
            dns_name: String::new(),
        };
        let Some(ip) = admit_ip_address(inventory, &self.config, &address, &ctx).await else {
            return Ok(());
        };
        derive_prefix(inventory, &ip.address, device.site, device.tenant, &self.meta(inventory, None)).await;

        let management = self
            .snapshot
            .devices
            .get(&record.device)
            .and_then(|d| d.management_address.as_deref())
            .and_then(|mgmt| mgmt.trim().parse::<IpAddr>().ok());
        let is_management = management.is_some_and(|mgmt| {
            parse_interface_address(&ip.address).is_ok_and(|net| net.ip() == mgmt)
        });
        if is_management {
            self.promote(inventory, &record.device, &ip).await?;
        }
        Ok(())
    }

    /// Makes `ip` the primary IPv4 of the device and refreshes the ID map.
    async fn promote(&self, inventory: &Inventory, device_id: &str, ip: &IpAddress) -> Result<()> {
        let Some(device) = self.devices.get(&device_id.to_string()) else {
            return Ok(());
        };
        let updated = set_primary_ips(inventory, &device, Some(ip), None).await?;
        self.devices.insert(device_id.to_string(), updated);
        Ok(())
    }

    async fn sync_wireless_lans(&self, inventory: &Inventory) -> Result<()> {
        for profile in &self.snapshot.wireless {
            let group = inventory
                .upsert(WirelessLanGroup {
                    meta: self.meta(inventory, None),
                    ..WirelessLanGroup::named(&profile.name)
                })
                .await?;
            for ssid in &profile.ssids {
                if ssid.ssid.trim().is_empty() {
                    continue;
                }
                inventory
                    .upsert(WirelessLan {
                        meta: self.meta(inventory, None),
                        ssid: ssid.ssid.clone(),
                        group: Some(group.id()),
                        vlan: ssid.vlan.and_then(|vid| self.vlans.get(&vid)).map(|v| v.id()),
                        auth_type: ssid.auth_type(),
                        auth_cipher: ssid.auth_cipher(),
                    })
                    .await?;
            }
        }
        Ok(())
    }

    /// Devices whose management address sits on no synced interface get a virtual
    /// management interface carrying it.
    async fn sync_missing_primary_ips(&self, inventory: &Inventory) -> Result<()> {
        for device_id in self.missing.keys() {
            let (Some(device), Some(address)) = (self.devices.get(&device_id), self.missing.get(&device_id)) else {
                continue;
            };
            let address = if address.contains('/') {
                address
            } else {
                match address.parse::<IpAddr>() {
                    Ok(IpAddr::V4(_)) => format!("{address}/32"),
                    Ok(IpAddr::V6(_)) => format!("{address}/128"),
                    Err(_) => {
                        warn!(device = %device.name, address = %address, "unusable management address");
                        continue;
                    }
                }
            };
            if !is_permitted(&address, &self.config.permitted_subnets, &self.config.ignored_subnets) {
                debug!(device = %device.name, address = %address, "management address not admitted");
                continue;
            }

            let iface = inventory
                .upsert(Interface {
                    meta: self.meta(inventory, None),
                    device: device.id(),
                    name: MANAGEMENT_INTERFACE.to_string(),
                    interface_type: Some(InterfaceType::Virtual),
                    enabled: Some(true),
                    ..Interface::default()
                })
                .await?;
            let ctx = AddressContext {
                assigned: iface.assigned(),
                meta: self.meta(inventory, None),
                tenant: device.tenant,
                dns_name: String::new(),
            };
            let Some(ip) = admit_ip_address(inventory, &self.config, &address, &ctx).await else {
                continue;
            };
            self.promote(inventory, &device_id, &ip).await?;
            self.missing.remove(&device_id);
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
