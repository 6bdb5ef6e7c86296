use pretty_assertions::assert_eq;
use ssot_common::model::*;
use ssot_core::{MemoryTarget, Phase};

use crate::support::{self, Harness};

#[test]
fn fixture_config_describes_both_sources() {
    let config = support::config();
    assert_eq!(config.concurrency, 8);
    let names: Vec<&str> = config.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["vcenter", "dnac"]);
    assert_eq!(support::source_config("dnac").source_tag(), "dna-center");
    assert_eq!(support::source_config("vcenter").source_tag(), "vcenter");
}

#[test]
fn malformed_snapshot_is_refused_up_front() {
    let config = support::source_config("vcenter");
    assert!(ssot_sources::from_config(config, "{ \"hosts\": [").is_err());
}

/// Both sources write into one inventory at once and meet on the shared site.
#[tokio::test]
async fn sources_share_objects_in_one_inventory() {
    let h = Harness::new().await;
    let reports = h.sync_ok(&["vcenter", "dnac"]).await;
    assert_eq!(reports[0].source, "vcenter");
    assert_eq!(reports[1].source, "dnac");
    let inv = &h.inventory;

    let sites: Vec<_> = inv.all::<Site>().into_iter().filter(|s| s.name == "Ljubljana").collect();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].physical_address, "Dunajska 1");

    let on_site = |name: &str| {
        inv.all::<Device>()
            .into_iter()
            .find(|d| d.name == name)
            .and_then(|d| d.site)
    };
    assert_eq!(on_site("esx-lj-01"), Some(sites[0].id()));
    assert_eq!(on_site("sw-lj-core"), Some(sites[0].id()));

    for tag in ["ssot", "vcenter", "dna-center"] {
        assert!(inv.lookup::<Tag>(&tag.to_string()).is_some(), "{tag}");
    }
    let switch = inv.all::<Device>().into_iter().find(|d| d.name == "sw-lj-core").unwrap();
    assert!(switch.meta.tags.contains("dna-center"));
    assert!(!switch.meta.tags.contains("vcenter"));
}

#[tokio::test]
async fn rerunning_both_sources_is_a_no_op() {
    let h = Harness::new().await;
    h.sync_ok(&["vcenter", "dnac"]).await;
    let creates = h.target.total_creates();
    let updates = h.target.total_updates();

    h.sync_ok(&["dnac", "vcenter"]).await;

    assert_eq!(h.target.total_creates(), creates);
    assert_eq!(h.target.total_updates(), updates);
}

/// A source whose phase fails stops there; the other source runs to the end.
#[tokio::test]
async fn failing_source_leaves_the_other_untouched() {
    let target = MemoryTarget::new().rejecting(ObjectKind::Vm, "read-only cluster", |_| true);
    let h = Harness::with_target(target).await;
    let reports = h.sync(&["vcenter", "dnac"]).await;

    let vcenter = &reports[0];
    assert_eq!(
        vcenter.completed,
        [Phase::Tags, Phase::Networks, Phase::Datacenters, Phase::Clusters, Phase::Hosts]
    );
    let failure = vcenter.failure.as_ref().unwrap().to_string();
    assert!(failure.starts_with("source vcenter, phase vms: "), "{failure}");
    assert!(failure.contains("workers failed"), "{failure}");

    assert!(reports[1].is_success(), "{:?}", reports[1].failure);
    assert_eq!(h.target.creates(ObjectKind::Vm), 0);
    assert!(h.inventory.all::<Device>().iter().any(|d| d.name == "ap-lj-01"));
    assert!(h.inventory.all::<Device>().iter().any(|d| d.name == "esx-lj-01"));
}
