//! Output formatting and styling module.
//!
//! Everything the CLI prints goes through [`OutputFormatter`], so the core
//! never writes to the console itself.

use crate::operation_log::{MoveStatus, OperationLog};
use crate::session::Statistics;
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for a run over `total` files.
    ///
    /// ```no_run
    /// use foldertidy::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints per-category counts and percentages.
    pub fn statistics_table(stats: &Statistics, dry_run: bool) {
        if stats.is_empty() {
            Self::info("No files were organized.");
            return;
        }

        Self::header(if dry_run {
            "PLANNED ORGANIZATION"
        } else {
            "ORGANIZATION STATISTICS"
        });

        let width = stats
            .categories()
            .iter()
            .map(|s| s.category.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {:>5} | {:>6}",
            "Category".bold(),
            "Files".bold(),
            "Share".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 18));
        for stat in stats.categories() {
            println!(
                "{:<width$} | {:>5} | {:>5.1}%",
                stat.category,
                stat.count.to_string().green(),
                stat.percentage,
                width = width
            );
        }
        println!("{}", "-".repeat(width + 18));
        println!(
            "{:<width$} | {:>5}",
            "Total".bold(),
            stats.total().to_string().green().bold(),
            width = width
        );
    }

    /// Lists every planned or performed move grouped by category.
    pub fn preview(log: &OperationLog) {
        let mut by_category: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for record in log.records() {
            if matches!(record.status(), MoveStatus::Planned | MoveStatus::Moved) {
                by_category
                    .entry(record.category())
                    .or_default()
                    .push(display_name(record.source_path(), record.destination_path()));
            }
        }

        if by_category.is_empty() {
            Self::info("No files found to organize.");
            return;
        }

        Self::header("ORGANIZATION PREVIEW");
        for (category, files) in by_category {
            let noun = if files.len() == 1 { "file" } else { "files" };
            println!("\n{} ({} {})", category.bold(), files.len(), noun);
            for file in files {
                println!("   {}", file);
            }
        }
    }

    /// Reports every record that was skipped or failed.
    pub fn problems(log: &OperationLog) {
        for record in log.with_status(MoveStatus::Skipped) {
            Self::warning(&format!(
                "Skipped {}: identical file already at {}",
                record.source_path().display(),
                record.destination_path().display()
            ));
        }
        for record in log.with_status(MoveStatus::Failed) {
            Self::error(&format!(
                "Could not move {}: {}",
                record.source_path().display(),
                record.error_detail().unwrap_or("unknown error")
            ));
        }
    }

    pub fn undo_report(report: &UndoReport) {
        Self::header("UNDO");
        println!("  Restored: {}", report.restored().to_string().green());
        if report.noops() > 0 {
            println!("  Already in place: {}", report.noops());
        }
        if report.failed() > 0 {
            println!("  Failed: {}", report.failed().to_string().red());
            for (path, reason) in report.failures() {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }
    }
}

/// `name` or `name -> renamed` when the destination name differs.
fn display_name(source: &Path, destination: &Path) -> String {
    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let destination_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if source_name == destination_name {
        source_name
    } else {
        format!("{} -> {}", source_name, destination_name)
    }
}
