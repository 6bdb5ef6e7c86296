use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use ssot_common::config::{Config, SourceConfig};
use ssot_core::{Inventory, MemoryTarget, Phase, Source, SourceReport, SyncOrchestrator};
use tracing::{info, warn};

use crate::commands::snapshot_path;
use crate::terminal::print;

pub async fn sync(
    config_path: &Path,
    config: Config,
    only: Option<&str>,
    phase: Option<Phase>,
) -> anyhow::Result<()> {
    let selected: Vec<SourceConfig> = match only {
        Some(name) => match config.source(name) {
            Some(source) => vec![source.clone()],
            None => bail!("no source named '{name}' in {}", config_path.display()),
        },
        None => config.sources.clone(),
    };
    if selected.is_empty() {
        warn!("no sources configured");
        return Ok(());
    }

    let source_tags: Vec<(String, String)> = selected.iter().map(ssot_sources::source_tag).collect();
    let sources = load_sources(config_path, selected)?;

    let target = Arc::new(MemoryTarget::new());
    let inventory = Arc::new(Inventory::new(target, config.tag.clone()));
    inventory
        .bootstrap(&source_tags)
        .await
        .context("registering inventory defaults")?;

    let orchestrator = SyncOrchestrator::new(Arc::clone(&inventory), config.concurrency);
    let started = Instant::now();
    let reports = match phase {
        Some(phase) => run_single_phase(&orchestrator, &sources, phase).await,
        None => orchestrator.run_all(sources).await,
    };

    summary(&inventory, &reports);
    let failed = reports.iter().filter(|r| !r.is_success()).count();
    print::fat_separator();
    if failed > 0 {
        bail!("{failed} of {} sources failed", reports.len());
    }
    info!("sync complete in {}", print::seconds(started.elapsed()));
    Ok(())
}

fn load_sources(config_path: &Path, configs: Vec<SourceConfig>) -> anyhow::Result<Vec<Arc<dyn Source>>> {
    configs
        .into_iter()
        .map(|config| {
            let path = snapshot_path(config_path, &config.snapshot);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading snapshot {} of source {}", path.display(), config.name))?;
            let name = config.name.clone();
            ssot_sources::from_config(config, &text).with_context(|| format!("loading source {name}"))
        })
        .collect()
}

async fn run_single_phase(
    orchestrator: &SyncOrchestrator,
    sources: &[Arc<dyn Source>],
    phase: Phase,
) -> Vec<SourceReport> {
    let mut reports = Vec::with_capacity(sources.len());
    for source in sources {
        let started = Instant::now();
        let mut report = SourceReport {
            source: source.name().to_string(),
            completed: Vec::new(),
            failure: None,
            elapsed: Default::default(),
        };
        if !source.phases().contains(&phase) {
            warn!(source = source.name(), %phase, "source has no such phase");
            reports.push(report);
            continue;
        }
        match orchestrator.run_phase(source.as_ref(), phase).await {
            Ok(()) => report.completed.push(phase),
            Err(err) => report.failure = Some(err),
        }
        report.elapsed = started.elapsed();
        reports.push(report);
    }
    reports
}

fn summary(inventory: &Inventory, reports: &[SourceReport]) {
    print::header("inventory");
    let stats = inventory.stats().snapshot();
    if stats.is_empty() {
        print::print("nothing written");
    }
    for (kind, kind_stats) in stats {
        print::kind_stats(kind, kind_stats);
    }

    print::header("sources");
    for report in reports {
        print::source_report(report);
    }
}
