pub mod check;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use ssot_common::config::Config;
use ssot_core::Phase;

#[derive(Parser)]
#[command(name = "ssot")]
#[command(about = "Reconciles source systems into one network inventory.")]
pub struct CommandLine {
    /// Log filter, overrides the config file and RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync every configured source into the inventory
    #[command(alias = "s")]
    Sync {
        #[arg(short, long)]
        config: PathBuf,
        /// Only sync the named source
        #[arg(long)]
        only: Option<String>,
        /// Only run this phase of each source
        #[arg(long)]
        phase: Option<Phase>,
    },
    /// Validate the configuration and show each source's phase plan
    #[command(alias = "c")]
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    Config::from_toml(&text).with_context(|| format!("loading config {}", path.display()))
}

/// Snapshot paths are relative to the config file.
pub fn snapshot_path(config_path: &Path, snapshot: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if snapshot.is_relative() => dir.join(snapshot),
        _ => snapshot.to_path_buf(),
    }
}
