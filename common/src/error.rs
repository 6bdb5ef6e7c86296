//! Error types shared by every library crate in the workspace.

use std::fmt;

use thiserror::Error;

use crate::model::ObjectKind;

pub type Result<T> = std::result::Result<T, SsotError>;

#[derive(Debug, Error)]
pub enum SsotError {
    /// A relation rule carries a pattern that does not compile.
    #[error("invalid relation pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration is malformed or inconsistent.
    #[error("configuration: {0}")]
    Config(String),

    /// The target inventory refused a create or update.
    #[error("{kind} {key} rejected by target: {reason}")]
    Rejected {
        kind: ObjectKind,
        key: String,
        reason: String,
    },

    /// A source record could not be interpreted.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A payload or snapshot could not be (de)serialized.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Workers(#[from] AggregateWorkerError),

    /// A spawned task panicked instead of returning.
    #[error("task for {0} panicked")]
    Panicked(String),

    /// A phase of a source failed and the remaining phases were skipped.
    #[error("source {source_name}, phase {phase}: {inner}")]
    Phase {
        source_name: String,
        phase: String,
        #[source]
        inner: Box<SsotError>,
    },
}

impl SsotError {
    pub fn rejected(kind: ObjectKind, key: impl fmt::Debug, reason: impl Into<String>) -> Self {
        SsotError::Rejected {
            kind,
            key: format!("{key:?}"),
            reason: reason.into(),
        }
    }

    pub fn invalid_record(msg: impl Into<String>) -> Self {
        SsotError::InvalidRecord(msg.into())
    }
}

/// A single failed unit of fan-out work.
#[derive(Debug)]
pub struct WorkerFailure {
    /// Source-native identifier of the entity the worker was handling.
    pub entity: String,
    pub error: SsotError,
}

/// Raised once every worker of a fanned-out phase has drained and at least one failed.
#[derive(Debug)]
pub struct AggregateWorkerError {
    pub total: usize,
    pub failures: Vec<WorkerFailure>,
}

impl AggregateWorkerError {
    pub fn first(&self) -> Option<&WorkerFailure> {
        self.failures.first()
    }
}

impl fmt::Display for AggregateWorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} workers failed", self.failures.len(), self.total)?;
        if let Some(first) = self.first() {
            write!(f, ", first: {}: {}", first.entity, first.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateWorkerError {}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
