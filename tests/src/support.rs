use std::sync::Arc;

use ssot_common::config::{Config, SourceConfig};
use ssot_core::{Inventory, MemoryTarget, Source, SourceReport, SyncOrchestrator};

pub const CONFIG: &str = include_str!("../fixtures/ssot.toml");
pub const VCENTER: &str = include_str!("../fixtures/vcenter.json");
pub const DNAC: &str = include_str!("../fixtures/dnac.json");

pub fn config() -> Config {
    Config::from_toml(CONFIG).expect("fixture config parses")
}

pub fn source_config(name: &str) -> SourceConfig {
    config().source(name).cloned().expect("source is configured")
}

/// Builds a configured source from its fixture snapshot.
pub fn source(name: &str) -> Arc<dyn Source> {
    let config = source_config(name);
    let snapshot = match config.snapshot.to_str() {
        Some("vcenter.json") => VCENTER,
        Some("dnac.json") => DNAC,
        other => panic!("no fixture for {other:?}"),
    };
    ssot_sources::from_config(config, snapshot).expect("fixture snapshot parses")
}

/// A bootstrapped inventory over a memory target, the way `ssot sync` wires one up.
pub struct Harness {
    pub target: Arc<MemoryTarget>,
    pub inventory: Arc<Inventory>,
    pub orchestrator: SyncOrchestrator,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_target(MemoryTarget::new()).await
    }

    pub async fn with_target(target: MemoryTarget) -> Self {
        let config = config();
        let target = Arc::new(target);
        let inventory = Arc::new(Inventory::new(target.clone(), config.tag.clone()));
        let tags: Vec<(String, String)> = config.sources.iter().map(ssot_sources::source_tag).collect();
        inventory.bootstrap(&tags).await.expect("bootstrap");
        let orchestrator = SyncOrchestrator::new(Arc::clone(&inventory), config.concurrency);
        Self {
            target,
            inventory,
            orchestrator,
        }
    }

    pub async fn sync(&self, names: &[&str]) -> Vec<SourceReport> {
        let sources = names.iter().map(|name| source(name)).collect();
        self.orchestrator.run_all(sources).await
    }

    /// Syncs `names` and fails the test unless every source succeeded.
    pub async fn sync_ok(&self, names: &[&str]) -> Vec<SourceReport> {
        let reports = self.sync(names).await;
        for report in &reports {
            assert!(report.is_success(), "{}: {:?}", report.source, report.failure);
        }
        reports
    }
}
