//! Organize sessions and the statistics derived from them.
//!
//! A session enumerates the regular, non-hidden files directly inside a root
//! directory, hands each one to the [`MoveExecutor`] and returns the filled
//! [`OperationLog`] with its [`Statistics`]. The only hard failure is an
//! unusable root, checked before anything moves; per-file problems end up in
//! the log as `Failed` records.

use crate::classifier::{Classifier, is_hidden};
use crate::config::{CompiledFilters, Config};
use crate::error::{OrganizeError, Result};
use crate::file_organizer::MoveExecutor;
use crate::operation_log::{LogSink, MoveRecord, MoveStatus, OperationLog};
use std::collections::BTreeMap;
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// Count and share of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStat {
    pub category: String,
    pub count: usize,
    /// Share of the counted files, 0.0 to 100.0.
    pub percentage: f64,
}

/// Per-category totals of a session, sorted by category name.
///
/// Counts `Moved` records, or `Planned` ones for a dry run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statistics {
    categories: Vec<CategoryStat>,
    total: usize,
}

impl Statistics {
    pub fn from_log(log: &OperationLog) -> Self {
        let counted = if log.is_dry_run() {
            MoveStatus::Planned
        } else {
            MoveStatus::Moved
        };

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in log.with_status(counted) {
            *counts.entry(record.category()).or_insert(0) += 1;
        }

        let total: usize = counts.values().sum();
        let categories = counts
            .into_iter()
            .map(|(category, count)| CategoryStat {
                category: category.to_string(),
                count,
                percentage: count as f64 / total as f64 * 100.0,
            })
            .collect();

        Self { categories, total }
    }

    pub fn categories(&self) -> &[CategoryStat] {
        &self.categories
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn get(&self, category: &str) -> Option<&CategoryStat> {
        self.categories.iter().find(|s| s.category == category)
    }

    pub fn count(&self, category: &str) -> usize {
        self.get(category).map_or(0, |s| s.count)
    }
}

/// Runs organize passes over a root directory.
#[derive(Debug, Clone, Default)]
pub struct OrganizeSession {
    executor: MoveExecutor,
    filters: CompiledFilters,
}

impl OrganizeSession {
    pub fn new(executor: MoveExecutor, filters: CompiledFilters) -> Self {
        Self { executor, filters }
    }

    /// Builds a session from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier = Classifier::new(config.category_table()?);
        let executor =
            MoveExecutor::new(classifier).with_skip_identical(config.organize.skip_identical);
        Ok(Self::new(executor, config.compile_filters()?))
    }

    pub fn executor(&self) -> &MoveExecutor {
        &self.executor
    }

    /// Organizes `root`, or only plans it when `dry_run` is set.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use foldertidy::session::OrganizeSession;
    /// use std::path::Path;
    ///
    /// let (log, stats) = OrganizeSession::default()
    ///     .organize(Path::new("/home/user/Downloads"), true)
    ///     .unwrap();
    /// println!("{} files would move in session {}", stats.total(), log.session_id());
    /// ```
    pub fn organize(&self, root: &Path, dry_run: bool) -> Result<(OperationLog, Statistics)> {
        self.organize_with(root, dry_run, |_, _| ControlFlow::Continue(()))
    }

    /// Organizes `root` for real, checkpointing the log into `sink` after
    /// every moved file.
    ///
    /// When a checkpoint fails the session stops before touching the next
    /// file and returns [`OrganizeError::Checkpoint`] naming the one move the
    /// sink does not hold. Every earlier move is covered by the last good
    /// checkpoint.
    pub fn organize_logged<S, F>(
        &self,
        root: &Path,
        sink: &mut S,
        mut on_record: F,
    ) -> Result<(OperationLog, Statistics)>
    where
        S: LogSink + ?Sized,
        F: FnMut(&OperationLog, &MoveRecord),
    {
        let mut checkpoint_failure = None;
        let (log, stats) = self.organize_with(root, false, |log, record| {
            on_record(log, record);
            if record.status() == MoveStatus::Moved
                && let Err(e) = sink.checkpoint(log)
            {
                tracing::error!(error = %e, "could not checkpoint operation log, stopping");
                checkpoint_failure = Some((
                    record.source_path().to_path_buf(),
                    record.destination_path().to_path_buf(),
                    e,
                ));
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        })?;

        match checkpoint_failure {
            Some((file, destination, error)) => Err(OrganizeError::Checkpoint {
                file,
                destination,
                error,
            }),
            None => Ok((log, stats)),
        }
    }

    /// Like [`OrganizeSession::organize`], calling `on_record` with the log
    /// and the newly appended record after every file. Returning
    /// `ControlFlow::Break` stops the session before the next file.
    pub fn organize_with<F>(
        &self,
        root: &Path,
        dry_run: bool,
        mut on_record: F,
    ) -> Result<(OperationLog, Statistics)>
    where
        F: FnMut(&OperationLog, &MoveRecord) -> ControlFlow<()>,
    {
        let root = Self::check_root(root)?;
        let _span = tracing::info_span!("organize", root = %root.display(), dry_run).entered();

        let files = self.eligible_files(&root)?;
        tracing::info!(files = files.len(), "starting organization");

        let mut log = OperationLog::new(root.clone(), dry_run);
        for file in &files {
            self.executor.execute(file, &root, dry_run, &mut log);
            if let Some(record) = log.records().last()
                && on_record(&log, record).is_break()
            {
                tracing::warn!(processed = log.len(), total = files.len(), "organization stopped");
                break;
            }
        }

        let stats = Statistics::from_log(&log);
        tracing::info!(
            counted = stats.total(),
            failed = log.count(MoveStatus::Failed),
            skipped = log.count(MoveStatus::Skipped),
            "organization finished"
        );
        Ok((log, stats))
    }

    /// Number of files an organize pass would consider.
    pub fn eligible_count(&self, root: &Path) -> Result<usize> {
        let root = Self::check_root(root)?;
        Ok(self.eligible_files(&root)?.len())
    }

    /// Fails unless `root` is an existing directory; returns it canonicalized.
    fn check_root(root: &Path) -> Result<PathBuf> {
        if !root.exists() {
            return Err(OrganizeError::RootNotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(OrganizeError::RootNotDirectory {
                path: root.to_path_buf(),
            });
        }
        root.canonicalize()
            .map_err(|e| OrganizeError::ReadDirectory {
                path: root.to_path_buf(),
                source: e,
            })
    }

    /// Regular, visible, non-excluded files directly under `root`, by name.
    /// Symlinks are skipped whatever they point to.
    fn eligible_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(root).map_err(|e| OrganizeError::ReadDirectory {
            path: root.to_path_buf(),
            source: e,
        })?;

        let mut files = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                tracing::debug!(file = %name, "skipping hidden file");
                continue;
            }

            let path = entry.path();
            // Symlinks are left alone.
            let is_file = fs::symlink_metadata(&path)
                .map(|m| m.file_type().is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            if !self.filters.should_include(&name) {
                tracing::debug!(file = %name, "excluded by filters");
                continue;
            }
            files.push(path);
        }

        files.sort();
        Ok(files)
    }
}
