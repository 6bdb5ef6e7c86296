//! # ssot sources
//!
//! Adapters that turn a collaborator's JSON snapshot into inventory upserts.
//!
//! * **[`hypervisor`]**: datacenters, clusters, hosts and VMs of a vSphere-like system.
//! * **[`controller`]**: sites, devices, interfaces and wireless LANs of a network controller.

use std::sync::Arc;

use ssot_common::Result;
use ssot_common::config::{SourceConfig, SourceType};
use ssot_common::model::{COLOR_BLUE, COLOR_GREEN};
use ssot_core::{Phase, Source};

pub mod controller;
pub mod hypervisor;
mod shared;

pub use controller::ControllerSource;
pub use hypervisor::HypervisorSource;

/// Builds the source `config` describes from the snapshot text it points to.
pub fn from_config(config: SourceConfig, snapshot: &str) -> Result<Arc<dyn Source>> {
    let source: Arc<dyn Source> = match config.source_type {
        SourceType::Hypervisor => Arc::new(HypervisorSource::from_json(config, snapshot)?),
        SourceType::Controller => Arc::new(ControllerSource::from_json(config, snapshot)?),
    };
    Ok(source)
}

/// Name and colour of the tag put on everything `config`'s source writes.
pub fn source_tag(config: &SourceConfig) -> (String, String) {
    let color = match config.source_type {
        SourceType::Hypervisor => COLOR_GREEN,
        SourceType::Controller => COLOR_BLUE,
    };
    (config.source_tag().to_string(), color.to_string())
}

/// Phases a source of `source_type` runs, in order.
pub fn phases_of(source_type: SourceType) -> &'static [Phase] {
    match source_type {
        SourceType::Hypervisor => hypervisor::PHASES,
        SourceType::Controller => controller::PHASES,
    }
}
