use std::sync::Arc;

use pretty_assertions::assert_eq;
use ssot_common::config::SourceType;
use ssot_common::model::*;
use ssot_core::{Inventory, MemoryTarget, Phase};

use crate::support::Harness;

fn device(inv: &Inventory, name: &str) -> Arc<Device> {
    inv.all::<Device>().into_iter().find(|d| d.name == name).unwrap()
}

fn vm(inv: &Inventory, name: &str) -> Option<Arc<Vm>> {
    inv.all::<Vm>().into_iter().find(|v| v.name == name)
}

fn ip(inv: &Inventory, address: &str) -> Option<Arc<IpAddress>> {
    inv.lookup::<IpAddress>(&address.to_string())
}

/// Every phase runs and hosts land on the sites their rules point to.
#[tokio::test]
async fn hosts_are_placed_by_their_rules() {
    let h = Harness::new().await;
    let reports = h.sync_ok(&["vcenter"]).await;
    assert_eq!(reports[0].completed, ssot_sources::phases_of(SourceType::Hypervisor));

    let inv = &h.inventory;
    let ljubljana = inv.lookup::<Site>(&"Ljubljana".to_string()).unwrap();
    let default = inv.default_site().await.unwrap();
    let infra = inv.lookup::<Tenant>(&"Infrastructure".to_string()).unwrap();

    let esx = device(inv, "esx-lj-01");
    assert_eq!(esx.site, Some(ljubljana.id()));
    assert_eq!(esx.tenant, Some(infra.id()));
    assert_eq!(esx.serial, "ABC1234");
    assert_eq!(esx.asset_tag, "INV-0042");
    assert!(esx.meta.tags.contains("rack-a"));

    let standalone = device(inv, "esx-standalone");
    assert_eq!(standalone.site, Some(default.id()));
    assert_eq!(standalone.status, Some(DeviceStatus::Offline));
    assert!(inv.lookup::<Cluster>(&"esx-standalone".to_string()).is_some());
}

/// Addresses outside the permitted subnets, or inside an ignored one, never reach the target.
#[tokio::test]
async fn subnet_lists_decide_which_addresses_are_kept() {
    let h = Harness::new().await;
    h.sync_ok(&["vcenter"]).await;
    let inv = &h.inventory;

    assert!(ip(inv, "10.0.110.21/24").is_some());
    assert!(ip(inv, "10.0.120.21/24").is_some());
    assert!(ip(inv, "2001:db8:10::11/64").is_some());

    assert!(ip(inv, "10.0.99.21/24").is_none());
    assert!(ip(inv, "172.16.0.5/24").is_none());
    assert!(ip(inv, "fe80::250:56ff:feaa:1/64").is_none());

    assert!(inv.lookup::<Prefix>(&"10.0.110.0/24".to_string()).is_some());
    assert!(inv.lookup::<Prefix>(&"10.0.99.0/24".to_string()).is_none());
}

#[tokio::test]
async fn vms_get_roles_tenants_contacts_and_a_gateway_primary() {
    let h = Harness::new().await;
    h.sync_ok(&["vcenter"]).await;
    let inv = &h.inventory;

    let web = vm(inv, "web01").unwrap();
    let web_team = inv.lookup::<Tenant>(&"Web Team".to_string()).unwrap();
    assert_eq!(web.tenant, Some(web_team.id()));
    assert_eq!(web.status, Some(VmStatus::Active));
    assert_eq!(web.primary_ipv4, Some(ip(inv, "10.0.120.21/24").unwrap().id()));
    assert!(web.meta.tags.contains("web"));
    assert_eq!(web.meta.custom_fields["CostCenter"], "CC-42");

    let db = vm(inv, "db01").unwrap();
    let database = inv.lookup::<DeviceRole>(&"Database".to_string()).unwrap();
    assert_eq!(db.role, Some(database.id()));
    assert_eq!(db.status, Some(VmStatus::Offline));
    assert_eq!(db.tenant, None);

    let marko = inv.lookup::<Contact>(&"Marko Horvat".to_string()).unwrap();
    assert_eq!(marko.email, "marko.horvat@example.com");
    let ana = inv.lookup::<Contact>(&"Ana Novak".to_string()).unwrap();
    assert_eq!(ana.email, "");
    let assigned = inv
        .all::<ContactAssignment>()
        .into_iter()
        .filter(|a| a.object == web.assigned())
        .count();
    assert_eq!(assigned, 2);

    let legacy = vm(inv, "legacy01").unwrap();
    let standalone = inv.lookup::<Cluster>(&"esx-standalone".to_string()).unwrap();
    assert_eq!(legacy.cluster, Some(standalone.id()));
}

#[tokio::test]
async fn templates_and_filtered_nics_are_left_out() {
    let h = Harness::new().await;
    h.sync_ok(&["vcenter"]).await;
    let inv = &h.inventory;

    assert!(vm(inv, "golden-ubuntu").is_none());

    let web = vm(inv, "web01").unwrap();
    let mut nics: Vec<String> = inv
        .all::<VmInterface>()
        .into_iter()
        .filter(|i| i.vm == web.id())
        .map(|i| i.name.clone())
        .collect();
    nics.sort();
    assert_eq!(nics, ["vNIC 1 (backend)", "vNIC 2 (frontend)"]);
}

/// Running the same snapshot again only confirms what is already there.
#[tokio::test]
async fn second_run_writes_nothing() {
    let h = Harness::new().await;
    h.sync_ok(&["vcenter"]).await;
    let creates = h.target.total_creates();
    let updates = h.target.total_updates();
    let devices = h.inventory.count::<Device>();
    let addresses = h.inventory.count::<IpAddress>();

    h.sync_ok(&["vcenter"]).await;

    assert_eq!(h.target.total_creates(), creates);
    assert_eq!(h.target.total_updates(), updates);
    assert_eq!(h.inventory.count::<Device>(), devices);
    assert_eq!(h.inventory.count::<IpAddress>(), addresses);
    assert!(h.inventory.stats().get(ObjectKind::Vm).unchanged >= 3);
}

/// A refused address is logged and skipped; the VM it belongs to still syncs.
#[tokio::test]
async fn rejected_address_does_not_fail_the_vm() {
    let target = MemoryTarget::new().rejecting(ObjectKind::IpAddress, "address reserved", |payload| {
        payload["address"] == "10.0.110.22/24"
    });
    let h = Harness::with_target(target).await;
    h.sync_ok(&["vcenter"]).await;
    let inv = &h.inventory;

    assert!(vm(inv, "db01").is_some());
    assert!(ip(inv, "10.0.110.22/24").is_none());
    assert!(ip(inv, "10.0.110.21/24").is_some());
}

/// A refused host stops the hosts phase of its source only.
#[tokio::test]
async fn rejected_host_fails_its_phase_but_not_other_sources() {
    let target = MemoryTarget::new().rejecting(ObjectKind::Device, "name reserved", |payload| {
        payload["name"] == "esx-lj-01"
    });
    let h = Harness::with_target(target).await;
    let reports = h.sync(&["vcenter", "dnac"]).await;

    let vcenter = &reports[0];
    assert_eq!(vcenter.completed, [Phase::Tags, Phase::Networks, Phase::Datacenters, Phase::Clusters]);
    let failure = vcenter.failure.as_ref().unwrap().to_string();
    assert!(failure.starts_with("source vcenter, phase hosts: "), "{failure}");

    assert!(reports[1].is_success(), "{:?}", reports[1].failure);
    let inv = &h.inventory;
    assert!(inv.all::<Device>().iter().any(|d| d.name == "sw-lj-core"));
    assert!(!inv.all::<Device>().iter().any(|d| d.name == "esx-lj-01"));
    assert!(vm(inv, "web01").is_none());
}

/// Prefixes are decoration: when the target refuses them every phase still completes.
#[tokio::test]
async fn rejected_prefixes_leave_addresses_in_place() {
    let target = MemoryTarget::new().rejecting(ObjectKind::Prefix, "managed elsewhere", |_| true);
    let h = Harness::with_target(target).await;
    let reports = h.sync_ok(&["vcenter"]).await;
    assert_eq!(reports[0].completed, ssot_sources::phases_of(SourceType::Hypervisor));
    let inv = &h.inventory;

    assert_eq!(inv.count::<Prefix>(), 0);
    assert!(inv.count::<IpAddress>() > 0);
    let primary = ip(inv, "10.0.120.21/24").unwrap();
    assert_eq!(vm(inv, "web01").unwrap().primary_ipv4, Some(primary.id()));
}
