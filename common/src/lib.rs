//! # ssot common
//!
//! Shared building blocks for the reconciliation workspace.
//!
//! * **[`model`]**: target-inventory objects, their natural keys and merge rules.
//! * **[`matcher`]**: ordered pattern → value relation rules.
//! * **[`config`]**: TOML configuration consumed by sources and the CLI.
//! * **[`network`]**: address, subnet and MAC helpers built on `pnet::ipnetwork`.
//! * **[`error`]**: the crate-wide [`SsotError`].

pub mod config;
pub mod error;
pub mod matcher;
pub mod model;
pub mod network;
pub mod utils;

pub use error::{AggregateWorkerError, Result, SsotError};
