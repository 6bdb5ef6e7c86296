use std::path::Path;

use colored::*;
use ssot_common::config::Config;

use crate::commands::snapshot_path;
use crate::terminal::print;

/// Loading the config already validated patterns and subnets; this lists what a sync would do.
pub fn check(config_path: &Path, config: &Config) -> anyhow::Result<()> {
    print::aligned_line("tag", &config.tag);
    print::aligned_line("concurrency", config.concurrency);

    for source in &config.sources {
        print::header(&source.name);
        let snapshot = snapshot_path(config_path, &source.snapshot);
        let exists = if snapshot.is_file() {
            "found".green()
        } else {
            "missing".red().bold()
        };
        print::aligned_line("type", source.source_type);
        print::aligned_line("snapshot", format!("{} ({exists})", snapshot.display()));

        let phases: Vec<&str> = ssot_sources::phases_of(source.source_type)
            .iter()
            .map(|phase| phase.as_str())
            .collect();
        print::aligned_line("phases", phases.join(" -> "));
    }
    print::fat_separator();
    Ok(())
}
