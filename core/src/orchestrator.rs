//! # Sync Orchestrator
//!
//! Runs each source's phases in the order the source declares them. A phase starts only after
//! the previous one finished, and the first failing phase ends that source's run. Independent
//! sources run concurrently and never stop each other.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ssot_common::{Result, SsotError};
use tracing::{error, info};

use crate::inventory::Inventory;
use crate::pool::WorkerPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Tags,
    Networks,
    Datacenters,
    Clusters,
    Hosts,
    Vms,
    Sites,
    Vlans,
    Devices,
    Interfaces,
    WirelessLans,
    MissingPrimaryIps,
}

impl Phase {
    pub const ALL: [Phase; 12] = [
        Phase::Tags,
        Phase::Networks,
        Phase::Datacenters,
        Phase::Clusters,
        Phase::Hosts,
        Phase::Vms,
        Phase::Sites,
        Phase::Vlans,
        Phase::Devices,
        Phase::Interfaces,
        Phase::WirelessLans,
        Phase::MissingPrimaryIps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Tags => "tags",
            Phase::Networks => "networks",
            Phase::Datacenters => "datacenters",
            Phase::Clusters => "clusters",
            Phase::Hosts => "hosts",
            Phase::Vms => "vms",
            Phase::Sites => "sites",
            Phase::Vlans => "vlans",
            Phase::Devices => "devices",
            Phase::Interfaces => "interfaces",
            Phase::WirelessLans => "wireless_lans",
            Phase::MissingPrimaryIps => "missing_primary_ips",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| format!("unknown phase: {s}"))
    }
}

/// What a phase gets to work with.
#[derive(Clone)]
pub struct SyncContext {
    pub inventory: Arc<Inventory>,
    pub pool: WorkerPool,
}

/// A system inventory data is pulled from.
#[async_trait]
pub trait Source: Send + Sync {
    fn name(&self) -> &str;

    /// Phases in execution order.
    fn phases(&self) -> &'static [Phase];

    async fn run_phase(&self, phase: Phase, ctx: &SyncContext) -> Result<()>;
}

/// Outcome of one source's run.
#[derive(Debug)]
pub struct SourceReport {
    pub source: String,
    pub completed: Vec<Phase>,
    /// The phase that failed, wrapped in [`SsotError::Phase`].
    pub failure: Option<SsotError>,
    pub elapsed: Duration,
}

impl SourceReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Clone)]
pub struct SyncOrchestrator {
    ctx: SyncContext,
}

impl SyncOrchestrator {
    pub fn new(inventory: Arc<Inventory>, concurrency: usize) -> Self {
        Self {
            ctx: SyncContext {
                inventory,
                pool: WorkerPool::new(concurrency),
            },
        }
    }

    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.ctx.inventory
    }

    /// Runs every phase of `source`, stopping at the first failure.
    pub async fn run(&self, source: &dyn Source) -> SourceReport {
        let started = Instant::now();
        let mut completed = Vec::new();
        let mut failure = None;

        for &phase in source.phases() {
            match self.run_phase(source, phase).await {
                Ok(()) => completed.push(phase),
                Err(err) => {
                    error!(source = source.name(), %phase, error = %err, "phase failed, skipping the rest");
                    failure = Some(err);
                    break;
                }
            }
        }

        SourceReport {
            source: source.name().to_string(),
            completed,
            failure,
            elapsed: started.elapsed(),
        }
    }

    /// Runs a single phase; used for replays and tests.
    pub async fn run_phase(&self, source: &dyn Source, phase: Phase) -> Result<()> {
        let started = Instant::now();
        source
            .run_phase(phase, &self.ctx)
            .await
            .map_err(|inner| SsotError::Phase {
                source_name: source.name().to_string(),
                phase: phase.to_string(),
                inner: Box::new(inner),
            })?;
        info!(
            source = source.name(),
            "synced {phase} in {:.3}s",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Runs all sources concurrently. Reports come back in the order of `sources`.
    pub async fn run_all(&self, sources: Vec<Arc<dyn Source>>) -> Vec<SourceReport> {
        let handles: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let name = source.name().to_string();
                let orchestrator = self.clone();
                let handle = tokio::spawn(async move { orchestrator.run(source.as_ref()).await });
                (name, handle)
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(join) => {
                    error!(source = %name, error = %join, "source task died");
                    SourceReport {
                        source: name.clone(),
                        completed: Vec::new(),
                        failure: Some(SsotError::Panicked(name)),
                        elapsed: Duration::ZERO,
                    }
                }
            };
            reports.push(report);
        }
        reports
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
