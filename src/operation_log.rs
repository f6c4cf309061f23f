/// Operation log recording every move of one organize session.
///
/// The log is what makes undo exact: each [`MoveRecord`] keeps the absolute
/// source and destination of one file. A log is serialized to JSON with
/// [`OperationLog::finalize`] and read back with [`OperationLog::load`];
/// [`LogStore`] handles where those files live under the target root.
use crate::error::LogError;
use chrono::{DateTime, Utc};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Directory under the target root holding persisted logs.
pub const LOG_DIR_NAME: &str = ".foldertidy_logs";

/// Outcome of one attempted or simulated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    /// Dry-run only: the move that would have happened.
    Planned,
    Moved,
    /// An identical file already sat at the destination.
    Skipped,
    Failed,
}

/// A single relocation, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    source_path: PathBuf,
    destination_path: PathBuf,
    category: String,
    timestamp: DateTime<Utc>,
    status: MoveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_detail: Option<String>,
}

impl MoveRecord {
    fn new(
        source_path: PathBuf,
        destination_path: PathBuf,
        category: String,
        status: MoveStatus,
        error_detail: Option<String>,
    ) -> Self {
        Self {
            source_path,
            destination_path,
            category,
            timestamp: Utc::now(),
            status,
            error_detail,
        }
    }

    pub fn planned(source: PathBuf, destination: PathBuf, category: impl Into<String>) -> Self {
        Self::new(source, destination, category.into(), MoveStatus::Planned, None)
    }

    pub fn moved(source: PathBuf, destination: PathBuf, category: impl Into<String>) -> Self {
        Self::new(source, destination, category.into(), MoveStatus::Moved, None)
    }

    pub fn skipped(source: PathBuf, destination: PathBuf, category: impl Into<String>) -> Self {
        Self::new(source, destination, category.into(), MoveStatus::Skipped, None)
    }

    pub fn failed(
        source: PathBuf,
        destination: PathBuf,
        category: impl Into<String>,
        error_detail: impl Into<String>,
    ) -> Self {
        Self::new(
            source,
            destination,
            category.into(),
            MoveStatus::Failed,
            Some(error_detail.into()),
        )
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> MoveStatus {
        self.status
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Checks the invariants `load` relies on.
    fn validate(&self, index: usize, dry_run: bool) -> Result<(), LogError> {
        let corrupted = |reason: String| LogError::Corrupted {
            reason: format!("record {index}: {reason}"),
        };

        if !self.source_path.is_absolute() {
            return Err(corrupted(format!(
                "source path {} is not absolute",
                self.source_path.display()
            )));
        }
        if !self.destination_path.is_absolute() {
            return Err(corrupted(format!(
                "destination path {} is not absolute",
                self.destination_path.display()
            )));
        }
        match (self.status, &self.error_detail) {
            (MoveStatus::Failed, None) => {
                return Err(corrupted("failed record without error detail".to_string()));
            }
            (status, Some(_)) if status != MoveStatus::Failed => {
                return Err(corrupted(format!("{status:?} record carries an error detail")));
            }
            _ => {}
        }
        if self.status == MoveStatus::Planned && !dry_run {
            return Err(corrupted("planned record in a non-dry-run log".to_string()));
        }
        if self.status == MoveStatus::Moved && dry_run {
            return Err(corrupted("moved record in a dry-run log".to_string()));
        }
        Ok(())
    }
}

/// Ordered record of one session's moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    session_id: String,
    root_directory: PathBuf,
    dry_run: bool,
    records: Vec<MoveRecord>,
}

impl OperationLog {
    /// Starts an empty log; the session id is derived from the current time.
    pub fn new(root_directory: PathBuf, dry_run: bool) -> Self {
        Self {
            session_id: Utc::now().format("%Y%m%d_%H%M%S_%6f").to_string(),
            root_directory,
            dry_run,
            records: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Appends a record and returns a reference to it.
    pub fn append(&mut self, record: MoveRecord) -> &MoveRecord {
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose file actually moved, in chronological order.
    pub fn moved(&self) -> impl DoubleEndedIterator<Item = &MoveRecord> {
        self.with_status(MoveStatus::Moved)
    }

    pub fn with_status(&self, status: MoveStatus) -> impl DoubleEndedIterator<Item = &MoveRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    pub fn count(&self, status: MoveStatus) -> usize {
        self.with_status(status).count()
    }

    /// True when the log describes real moves worth keeping for undo.
    pub fn should_persist(&self) -> bool {
        !self.dry_run && self.moved().next().is_some()
    }

    /// Serializes the log to its durable JSON form.
    pub fn finalize(&self) -> Result<String, LogError> {
        serde_json::to_string_pretty(self).map_err(LogError::Serialize)
    }

    /// Rebuilds a log from the output of [`OperationLog::finalize`].
    ///
    /// The whole log is validated before it is returned, so a corrupted log
    /// is rejected before any undo work starts.
    pub fn load(serialized: &str) -> Result<Self, LogError> {
        let log: OperationLog =
            serde_json::from_str(serialized).map_err(|e| LogError::Corrupted {
                reason: format!("JSON parse error: {}", e),
            })?;

        if log.session_id.is_empty() {
            return Err(LogError::Corrupted {
                reason: "empty session id".to_string(),
            });
        }
        if !log.root_directory.is_absolute() {
            return Err(LogError::Corrupted {
                reason: format!(
                    "root directory {} is not absolute",
                    log.root_directory.display()
                ),
            });
        }
        for (index, record) in log.records.iter().enumerate() {
            record.validate(index, log.dry_run)?;
        }
        Ok(log)
    }
}

/// Locates, reads and writes persisted logs under a target root.
#[derive(Debug, Clone)]
pub struct LogStore {
    dir: PathBuf,
}

impl LogStore {
    /// A store for logs of sessions run against `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            dir: root.join(LOG_DIR_NAME),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the pending log file for a session.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("operations_{session_id}.json"))
    }

    /// Writes the log if it should be persisted, returning its path.
    ///
    /// Saving the same session again overwrites its file, so this can be
    /// called after every move to checkpoint a running session.
    pub fn save(&self, log: &OperationLog) -> Result<Option<PathBuf>, LogError> {
        if !log.should_persist() {
            return Ok(None);
        }

        fs::create_dir_all(&self.dir).map_err(|e| LogError::Write {
            path: self.dir.clone(),
            source: e,
        })?;

        let path = self.path_for(log.session_id());
        let json = log.finalize()?;
        // Written beside the target and renamed over it, so an interrupted
        // save leaves the previous checkpoint intact.
        let write_error = |source| LogError::Write {
            path: path.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(write_error)?;
        staged.write_all(json.as_bytes()).map_err(write_error)?;
        staged.as_file().sync_all().map_err(write_error)?;
        staged.persist(&path).map_err(|e| write_error(e.error))?;

        tracing::debug!(path = %path.display(), records = log.len(), "operation log saved");
        Ok(Some(path))
    }

    /// Pending (not yet undone) log files, oldest first.
    pub fn pending(&self) -> Result<Vec<PathBuf>, LogError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = Pattern::new("operations_*.json").map_err(|e| LogError::Corrupted {
            reason: e.to_string(),
        })?;
        let entries = fs::read_dir(&self.dir).map_err(|e| LogError::Read {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut logs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .map(|name| pattern.matches(&name.to_string_lossy()))
                        .unwrap_or(false)
            })
            .collect();
        // Session ids are zero-padded timestamps, so name order is time order.
        logs.sort();
        Ok(logs)
    }

    /// The most recent pending log.
    pub fn latest(&self) -> Result<PathBuf, LogError> {
        self.pending()?
            .pop()
            .ok_or_else(|| LogError::NotFound {
                dir: self.dir.clone(),
            })
    }

    /// Reads and validates a log file.
    pub fn read(path: &Path) -> Result<OperationLog, LogError> {
        if !path.exists() {
            return Err(LogError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|e| LogError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        OperationLog::load(&content)
    }

    /// Renames a log to `*.json.undone` so it is no longer an undo target.
    pub fn mark_undone(path: &Path) -> Result<PathBuf, LogError> {
        let mut undone = path.as_os_str().to_owned();
        undone.push(".undone");
        let undone = PathBuf::from(undone);
        fs::rename(path, &undone).map_err(|e| LogError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(undone)
    }
}

/// Destination for the checkpoints of a running session.
pub trait LogSink {
    /// Durably records the log as it stands.
    fn checkpoint(&mut self, log: &OperationLog) -> Result<(), LogError>;
}

impl LogSink for LogStore {
    fn checkpoint(&mut self, log: &OperationLog) -> Result<(), LogError> {
        LogStore::save(self, log).map(|_| ())
    }
}
