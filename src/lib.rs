//! foldertidy - sort a directory's files into category folders, reversibly
//!
//! This library classifies the files directly inside a directory by
//! extension, moves them into category subdirectories without ever
//! overwriting anything, and records every move in an operation log that
//! the undo engine can replay in reverse.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod conflict;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod interactive;
pub mod operation_log;
pub mod output;
pub mod session;
pub mod undo;

pub use classifier::{Classifier, FALLBACK_CATEGORY};
pub use config::{CompiledFilters, Config};
pub use error::{ConfigError, LogError, OrganizeError, Result};
pub use file_category::{CategoryRule, CategoryTable};
pub use file_organizer::MoveExecutor;
pub use operation_log::{LogSink, LogStore, MoveRecord, MoveStatus, OperationLog};
pub use session::{CategoryStat, OrganizeSession, Statistics};
pub use undo::{UndoEngine, UndoOutcome, UndoReport};

pub use cli::{OrganizeCommand, run_cli};

/// Initialize tracing for the binary.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` is used on stderr.
/// With `run_log_dir`, the run is also logged at `info` level to
/// `foldertidy_<timestamp>.log` in that directory. Keep the returned guard
/// alive until exit so the file is flushed.
pub fn init_tracing(
    default_level: &str,
    run_log_dir: Option<&std::path::Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_for =
        |level: &str| EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter_for(default_level));

    let mut guard = None;
    let file_layer = match run_log_dir.map(|dir| (dir, open_run_log(dir))) {
        Some((_, Ok(appender))) => {
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(filter_for("info")),
            )
        }
        Some((dir, Err(e))) => {
            output::OutputFormatter::warning(&format!(
                "Could not open a run log in {}: {}",
                dir.display(),
                e
            ));
            None
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    guard
}

fn open_run_log(
    dir: &std::path::Path,
) -> std::result::Result<
    tracing_appender::rolling::RollingFileAppender,
    tracing_appender::rolling::InitError,
> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(format!(
            "foldertidy_{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ))
        .filename_suffix("log")
        .build(dir)
}

/// Organizes `root` with the built-in category table.
pub fn organize(root: &std::path::Path, dry_run: bool) -> Result<(OperationLog, Statistics)> {
    OrganizeSession::default().organize(root, dry_run)
}

/// Reverses the moves recorded in an already loaded log.
pub fn undo(log: &OperationLog) -> UndoReport {
    UndoEngine::undo(log)
}
