//! Console summary and JSON export.

use anyhow::{Context, Result};
use colored::Colorize;
use fw_core::{CountRow, RunReport};
use std::path::Path;

/// Writes the structured report for downstream consumers (including the
/// external dashboard renderer).
pub fn write_json(path: &Path, report: &RunReport) -> Result<()> {
    let serialized = serde_json::to_string_pretty(report)?;
    std::fs::write(path, serialized)
        .with_context(|| format!("failed to write JSON report: {}", path.display()))?;
    Ok(())
}

/// Prints the run summary and the top-N tables to stdout.
pub fn print_summary(report: &RunReport) {
    println!();
    println!(
        "{}  {}",
        "fwreport".bold(),
        format!("generated {}", report.meta.generated_at).dimmed()
    );
    println!(
        "  log: {}   events: {}   sources: {}   countries: {}",
        report.meta.log_file,
        report.total_events.to_string().bold(),
        report.sources.len().to_string().bold(),
        report.countries.len().to_string().bold(),
    );

    if report.sources.is_empty() {
        println!("\n  {}", "no matching firewall events".yellow());
        return;
    }

    println!("\n{}", "Top sources".bold().underline());
    println!("  {:<5} {:<40} {:>8}  {:<8} {}", "#", "ADDRESS", "COUNT", "COUNTRY", "OWNER");
    for (idx, source) in report.sources.iter().enumerate() {
        println!(
            "  {:<5} {:<40} {:>8}  {:<8} {}",
            idx + 1,
            source.address,
            source.count,
            source.country,
            source.owner
        );
    }

    print_table("Prefixes", &report.prefixes);
    print_table("Protocols", &report.protocols);

    println!("\n{}", "Top ports".bold().underline());
    println!("  {:<5} {:<8} {:<16} {:>8}", "#", "PORT", "SERVICE", "COUNT");
    for (idx, row) in report.ports.iter().enumerate() {
        println!(
            "  {:<5} {:<8} {:<16} {:>8}",
            idx + 1,
            row.port,
            row.service.to_uppercase(),
            row.count
        );
    }

    print_table("Countries", &report.countries);
    println!();
}

fn print_table(title: &str, rows: &[CountRow]) {
    println!("\n{}", title.bold().underline());
    for (idx, row) in rows.iter().enumerate() {
        println!("  {:<5} {:<40} {:>8}", idx + 1, row.key, row.count);
    }
}
