use std::sync::Arc;

use pretty_assertions::assert_eq;
use ssot_common::config::SourceType;
use ssot_common::model::*;
use ssot_core::Inventory;

use crate::support::Harness;

fn device(inv: &Inventory, name: &str) -> Arc<Device> {
    inv.all::<Device>().into_iter().find(|d| d.name == name).unwrap()
}

fn interface(inv: &Inventory, device: &Device, name: &str) -> Option<Arc<Interface>> {
    inv.lookup::<Interface>(&(device.id(), name.to_string()))
}

fn vlan(inv: &Inventory, vid: u16) -> Arc<Vlan> {
    inv.all::<Vlan>().into_iter().find(|v| v.vid == vid).unwrap()
}

/// Only buildings become sites; devices on a floor are placed in its building.
#[tokio::test]
async fn buildings_are_the_only_sites() {
    let h = Harness::new().await;
    let reports = h.sync_ok(&["dnac"]).await;
    assert_eq!(reports[0].completed, ssot_sources::phases_of(SourceType::Controller));
    let inv = &h.inventory;

    let ljubljana = inv.lookup::<Site>(&"Ljubljana".to_string()).unwrap();
    assert_eq!(ljubljana.physical_address, "Dunajska 1");
    for name in ["Global", "EMEA", "Ljubljana Floor 1"] {
        assert!(inv.lookup::<Site>(&name.to_string()).is_none(), "{name}");
    }

    let switch = device(inv, "sw-lj-core");
    assert_eq!(switch.site, Some(ljubljana.id()));
    assert_eq!(switch.serial, "FOC2401X0AB");
    let role = inv.lookup::<DeviceRole>(&"Switches and Hubs".to_string()).unwrap();
    assert_eq!(switch.role, Some(role.id()));
}

#[tokio::test]
async fn management_addresses_become_primaries() {
    let h = Harness::new().await;
    h.sync_ok(&["dnac"]).await;
    let inv = &h.inventory;

    let switch = device(inv, "sw-lj-core");
    let svi = inv.lookup::<IpAddress>(&"10.0.50.1/24".to_string()).unwrap();
    assert_eq!(switch.primary_ipv4, Some(svi.id()));
    assert!(interface(inv, &switch, "Management").is_none());

    let ap = device(inv, "ap-lj-01");
    let mgmt = interface(inv, &ap, "Management").unwrap();
    assert_eq!(mgmt.interface_type, Some(InterfaceType::Virtual));
    let address = inv.lookup::<IpAddress>(&"10.0.60.7/32".to_string()).unwrap();
    assert_eq!(address.assigned, Some(mgmt.assigned()));
    assert_eq!(ap.primary_ipv4, Some(address.id()));
}

#[tokio::test]
async fn filtered_interfaces_and_their_addresses_are_skipped() {
    let h = Harness::new().await;
    h.sync_ok(&["dnac"]).await;
    let inv = &h.inventory;

    let switch = device(inv, "sw-lj-core");
    assert!(interface(inv, &switch, "Loopback0").is_none());
    assert!(inv.lookup::<IpAddress>(&"10.255.0.1/32".to_string()).is_none());

    let uplink = interface(inv, &switch, "TenGigabitEthernet1/1/1").unwrap();
    assert_eq!(uplink.mode, Some(InterfaceMode::TaggedAll));
    assert_eq!(uplink.mtu, 9198);
}

#[tokio::test]
async fn ssids_become_wireless_lans_on_their_vlan() {
    let h = Harness::new().await;
    h.sync_ok(&["dnac"]).await;
    let inv = &h.inventory;

    assert_eq!(vlan(inv, 50).name, "VLAN0050_mgmt");
    assert_eq!(vlan(inv, 60).name, "VLAN0060");

    let group = inv.lookup::<WirelessLanGroup>(&"Corporate".to_string()).unwrap();
    let corp = inv.lookup::<WirelessLan>(&"corp".to_string()).unwrap();
    assert_eq!(corp.group, Some(group.id()));
    assert_eq!(corp.vlan, Some(vlan(inv, 60).id()));
    assert_eq!(corp.auth_type, Some(WirelessAuthType::WpaEnterprise));
    assert_eq!(corp.auth_cipher, Some(WirelessAuthCipher::Aes));

    let guest = inv.lookup::<WirelessLan>(&"guest".to_string()).unwrap();
    assert_eq!(guest.auth_type, Some(WirelessAuthType::Open));
    assert_eq!(guest.vlan, None);
}

/// The management interface created on the first run is found again on the second.
#[tokio::test]
async fn second_run_writes_nothing() {
    let h = Harness::new().await;
    h.sync_ok(&["dnac"]).await;
    let creates = h.target.total_creates();
    let updates = h.target.total_updates();

    h.sync_ok(&["dnac"]).await;

    assert_eq!(h.target.total_creates(), creates);
    assert_eq!(h.target.total_updates(), updates);
    assert_eq!(h.target.creates(ObjectKind::Interface), 3);
}
