//! # ssot core
//!
//! The reconciliation engine.
//!
//! * **[`inventory`]**: the upsert cache, one registry per object kind.
//! * **[`relations`]**: rule-driven resolution of sites, tenants, roles and VLAN groups.
//! * **[`orchestrator`]**: phase sequencing per source and concurrent runs across sources.
//! * **[`pool`]**: bounded fan-out with drain-then-aggregate error handling.
//! * **[`primary`]**: primary IP / MAC selection and assignment.
//! * **[`target`]**: the port to the target inventory and its in-memory implementation.

pub mod enrich;
pub mod idmap;
pub mod inventory;
pub mod orchestrator;
pub mod pool;
pub mod primary;
pub mod relations;
pub mod target;

pub use idmap::IdMap;
pub use inventory::Inventory;
pub use orchestrator::{Phase, Source, SourceReport, SyncContext, SyncOrchestrator};
pub use pool::WorkerPool;
pub use target::{MemoryTarget, TargetClient};
