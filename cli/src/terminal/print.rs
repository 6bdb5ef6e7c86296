use std::fmt::Display;
use std::time::Duration;

use colored::*;
use ssot_common::model::ObjectKind;
use ssot_core::SourceReport;
use ssot_core::inventory::KindStats;
use tracing::info;

pub const TARGET: &str = "ssot::print";
pub const TOTAL_WIDTH: usize = 64;
const KEY_WIDTH: usize = 22;

pub fn print(msg: &str) {
    info!(target: TARGET, "{msg}");
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    print(&format!("{}", line));
}

pub fn fat_separator() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).bright_black();
    print(&format!("{}", sep));
}

pub fn aligned_line<V: Display>(key: &str, value: V) {
    let dots: String = ".".repeat((KEY_WIDTH + 1).saturating_sub(key.len()));
    print(&format!(
        "{} {}{}{} {}",
        ">".bright_black(),
        key.cyan(),
        dots.bright_black(),
        ":".bright_black(),
        value
    ));
}

pub fn kind_stats(kind: ObjectKind, stats: KindStats) {
    aligned_line(
        kind.as_str(),
        format!(
            "{} created, {} updated, {} unchanged",
            stats.created.to_string().green().bold(),
            stats.updated.to_string().yellow().bold(),
            stats.unchanged.to_string().bright_black()
        ),
    );
}

pub fn source_report(report: &SourceReport) {
    let phases: Vec<&str> = report.completed.iter().map(|p| p.as_str()).collect();
    let elapsed = seconds(report.elapsed);
    match &report.failure {
        None => aligned_line(
            &report.source,
            format!("{} ({} phases in {elapsed})", "ok".green().bold(), phases.len()),
        ),
        Some(err) => aligned_line(&report.source, format!("{} {err}", "failed:".red().bold())),
    }
}

pub fn seconds(elapsed: Duration) -> ColoredString {
    format!("{:.2}s", elapsed.as_secs_f64()).bold().yellow()
}
