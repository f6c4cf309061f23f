//! Command-line interface module for foldertidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading
//! - Organization orchestration with progress and checkpointing
//! - Locating the operation log to undo

use crate::config::Config;
use crate::error::Result;
use crate::operation_log::{LOG_DIR_NAME, LogStore, MoveStatus};
use crate::output::OutputFormatter;
use crate::session::OrganizeSession;
use crate::undo::UndoEngine;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Sort the files of a directory into category subfolders by extension.
#[derive(Parser, Debug)]
#[command(name = "foldertidy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to organize
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Show what would happen without moving anything
    #[arg(long, conflicts_with_all = ["undo", "preview"])]
    pub dry_run: bool,

    /// Show every planned move grouped by category
    #[arg(long, conflicts_with = "undo")]
    pub preview: bool,

    /// Undo the most recent organization of the directory
    #[arg(long)]
    pub undo: bool,

    /// Operation log to undo instead of the most recent one
    #[arg(long, value_name = "PATH", requires = "undo")]
    pub log: Option<PathBuf>,

    /// Choose the folder and the action from menus
    #[arg(short, long, conflicts_with_all = ["dry_run", "preview", "undo"])]
    pub interactive: bool,

    /// Configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Directory for this invocation's run log. Only real organize and undo
    /// runs on an existing directory write one, so dry runs stay read-only.
    pub fn run_log_dir(&self) -> Option<PathBuf> {
        let mutates = !self.interactive && !self.dry_run && !self.preview;
        (mutates && self.directory.is_dir()).then(|| self.directory.join(LOG_DIR_NAME))
    }

    pub fn organize_command(&self) -> OrganizeCommand {
        if self.undo {
            OrganizeCommand::Undo {
                log: self.log.clone(),
            }
        } else if self.preview {
            OrganizeCommand::Preview
        } else {
            OrganizeCommand::Organize {
                dry_run: self.dry_run,
            }
        }
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Organize files in a directory.
    Organize {
        /// If true, simulate the operation without making changes.
        dry_run: bool,
    },
    /// List every planned move without making changes.
    Preview,
    /// Undo a previous organization.
    Undo {
        /// Log file to apply; the most recent one when `None`.
        log: Option<PathBuf>,
    },
}

/// Runs a command against a directory with the default configuration lookup.
///
/// # Examples
///
/// ```no_run
/// use foldertidy::cli::{run_cli, OrganizeCommand};
/// use std::path::Path;
///
/// let result = run_cli(OrganizeCommand::Organize { dry_run: true }, Path::new("/path/to/directory"));
/// if let Err(e) = result {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, dir_path: &Path) -> Result<()> {
    run_cli_with_config(command, dir_path, None)
}

/// Runs a command with an optional explicit configuration file.
pub fn run_cli_with_config(
    command: OrganizeCommand,
    dir_path: &Path,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        OrganizeCommand::Organize { dry_run } => {
            let session = OrganizeSession::from_config(&Config::load(config_path)?)?;
            organize_directory(&session, dir_path, dry_run)
        }
        OrganizeCommand::Preview => {
            let session = OrganizeSession::from_config(&Config::load(config_path)?)?;
            preview_directory(&session, dir_path)
        }
        OrganizeCommand::Undo { log } => undo_organization(dir_path, log.as_deref()),
    }
}

/// Organizes (or dry-runs) a directory and saves the log for undo.
///
/// The log is checkpointed after every moved file, so an interrupted run
/// still leaves an undoable log behind. A failed checkpoint stops the run.
fn organize_directory(session: &OrganizeSession, dir_path: &Path, dry_run: bool) -> Result<()> {
    if dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing {}", dir_path.display()));
        let (log, stats) = session.organize(dir_path, true)?;
        OutputFormatter::problems(&log);
        OutputFormatter::statistics_table(&stats, true);
        println!();
        OutputFormatter::success("Dry run complete. No files were modified.");
        return Ok(());
    }

    OutputFormatter::info(&format!("Organizing contents of: {}", dir_path.display()));
    let mut store = LogStore::new(dir_path);
    let pb = OutputFormatter::create_progress_bar(session.eligible_count(dir_path)? as u64);
    let result = session.organize_logged(dir_path, &mut store, |_, _| pb.inc(1));
    pb.finish_and_clear();
    let (log, stats) = result?;

    OutputFormatter::problems(&log);
    OutputFormatter::statistics_table(&stats, false);

    if log.should_persist() {
        println!();
        OutputFormatter::success(&format!(
            "Organization complete! History saved to {}",
            store.path_for(log.session_id()).display()
        ));
        OutputFormatter::info(&format!(
            "Use 'foldertidy {} --undo' to revert changes.",
            dir_path.display()
        ));
    }

    if log.count(MoveStatus::Failed) > 0 {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    }

    Ok(())
}

/// Prints every planned move without changing anything.
fn preview_directory(session: &OrganizeSession, dir_path: &Path) -> Result<()> {
    let (log, stats) = session.organize(dir_path, true)?;
    OutputFormatter::preview(&log);
    OutputFormatter::statistics_table(&stats, true);
    Ok(())
}

/// Undoes an organization run using the given or most recent log.
///
/// The log file is retired only when every record was restored (or was
/// already in place), so a partially failed undo can be retried.
fn undo_organization(dir_path: &Path, log_path: Option<&Path>) -> Result<()> {
    let path = match log_path {
        Some(path) => path.to_path_buf(),
        None => LogStore::new(dir_path).latest()?,
    };

    OutputFormatter::info(&format!("Undoing organization recorded in {}", path.display()));
    let log = LogStore::read(&path)?;
    let report = UndoEngine::undo(&log);
    OutputFormatter::undo_report(&report);

    if report.is_complete_success() {
        if let Err(e) = LogStore::mark_undone(&path) {
            OutputFormatter::warning(&format!("Could not retire history file: {}", e));
        }
        OutputFormatter::success("Undo complete!");
    } else {
        OutputFormatter::warning("History file was kept because some files could not be restored.");
        OutputFormatter::warning("Fix the issues above and run the undo again.");
    }

    Ok(())
}
