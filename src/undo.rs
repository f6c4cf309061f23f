/// Undo functionality for reverting file organization operations.
///
/// The undo engine replays the `Moved` records of an [`OperationLog`] in
/// reverse order, moving each file back to where it came from. It never
/// renames a file to dodge a conflict and never recreates a missing parent
/// directory: such records fail individually and the pass continues.
use crate::file_organizer::relocate;
use crate::operation_log::{MoveRecord, OperationLog};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What happened to one record during undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The file is back at its original path.
    Succeeded,
    /// The file could not be restored; the reason is attached.
    Failed(String),
    /// Nothing at the destination any more, typically because an earlier
    /// undo already restored it.
    Noop,
}

/// The undo outcome of a single log record.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub outcome: UndoOutcome,
}

/// Represents the result of an undo operation.
#[derive(Debug, Clone, Default)]
pub struct UndoReport {
    /// One entry per processed record, in processing (reverse) order.
    pub entries: Vec<UndoEntry>,
}

impl UndoReport {
    fn count(&self, predicate: impl Fn(&UndoOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.outcome)).count()
    }

    /// Number of files moved back.
    pub fn restored(&self) -> usize {
        self.count(|o| *o == UndoOutcome::Succeeded)
    }

    /// Number of records that could not be restored.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UndoOutcome::Failed(_)))
    }

    /// Number of records that needed no action.
    pub fn noops(&self) -> usize {
        self.count(|o| *o == UndoOutcome::Noop)
    }

    /// Entries that failed, with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            UndoOutcome::Failed(reason) => Some((e.source_path.as_path(), reason.as_str())),
            _ => None,
        })
    }

    pub fn total_processed(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no record failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Returns whether any entry occupies `path`, dangling symlinks included.
fn exists(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Reverses the moves recorded in an operation log.
pub struct UndoEngine;

impl UndoEngine {
    /// Undoes every `Moved` record of the log, most recent first.
    ///
    /// Running it again on the same log is safe: records whose file is
    /// already back report [`UndoOutcome::Noop`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use foldertidy::operation_log::LogStore;
    /// use foldertidy::undo::UndoEngine;
    /// use std::path::Path;
    ///
    /// let store = LogStore::new(Path::new("/path/to/directory"));
    /// let log = LogStore::read(&store.latest().unwrap()).unwrap();
    /// let report = UndoEngine::undo(&log);
    /// println!("Restored {} files", report.restored());
    /// ```
    pub fn undo(log: &OperationLog) -> UndoReport {
        let _span = tracing::info_span!("undo", session = log.session_id()).entered();

        let entries: Vec<UndoEntry> = log
            .moved()
            .rev()
            .map(|record| {
                let outcome = Self::restore(record);
                match &outcome {
                    UndoOutcome::Succeeded => tracing::info!(
                        destination = %record.destination_path().display(),
                        source = %record.source_path().display(),
                        "restored file"
                    ),
                    UndoOutcome::Failed(reason) => tracing::warn!(
                        source = %record.source_path().display(),
                        reason = reason.as_str(),
                        "could not restore file"
                    ),
                    UndoOutcome::Noop => tracing::debug!(
                        destination = %record.destination_path().display(),
                        "nothing to restore"
                    ),
                }
                UndoEntry {
                    source_path: record.source_path().to_path_buf(),
                    destination_path: record.destination_path().to_path_buf(),
                    outcome,
                }
            })
            .collect();

        UndoReport { entries }
    }

    /// Moves one file back to its original location.
    fn restore(record: &MoveRecord) -> UndoOutcome {
        let source = record.source_path();
        let destination = record.destination_path();

        match exists(destination) {
            Ok(false) => return UndoOutcome::Noop,
            Ok(true) => {}
            Err(e) => {
                return UndoOutcome::Failed(format!(
                    "cannot inspect {}: {}",
                    destination.display(),
                    e
                ));
            }
        }

        let parent_exists = source.parent().is_some_and(Path::is_dir);
        if !parent_exists {
            return UndoOutcome::Failed(format!(
                "original directory of {} no longer exists",
                source.display()
            ));
        }

        match exists(source) {
            Ok(true) => {
                return UndoOutcome::Failed(format!(
                    "{} is already occupied",
                    source.display()
                ));
            }
            Ok(false) => {}
            Err(e) => {
                return UndoOutcome::Failed(format!("cannot inspect {}: {}", source.display(), e));
            }
        }

        match relocate(destination, source) {
            Ok(()) => UndoOutcome::Succeeded,
            Err(e) => UndoOutcome::Failed(format!("failed to restore file: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_organizer::MoveExecutor;
    use crate::operation_log::MoveStatus;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory");
        (temp_dir, root)
    }

    fn organize_files(root: &Path, names: &[&str]) -> OperationLog {
        let executor = MoveExecutor::default();
        let mut log = OperationLog::new(root.to_path_buf(), false);
        for name in names {
            let path = root.join(name);
            fs::write(&path, name.as_bytes()).expect("Failed to write test file");
            executor.execute(&path, root, false, &mut log);
        }
        log
    }

    #[test]
    fn test_undo_single_file() {
        let (_guard, root) = setup();
        let log = organize_files(&root, &["test.txt"]);
        assert!(root.join("Documents").join("test.txt").exists());

        let report = UndoEngine::undo(&log);

        assert_eq!(report.restored(), 1);
        assert!(report.is_complete_success());
        assert!(root.join("test.txt").exists());
        assert!(!root.join("Documents").join("test.txt").exists());
    }

    #[test]
    fn test_undo_multiple_files() {
        let (_guard, root) = setup();
        let log = organize_files(&root, &["image.png", "document.pdf", "song.mp3"]);

        let report = UndoEngine::undo(&log);

        assert_eq!(report.restored(), 3);
        for name in ["image.png", "document.pdf", "song.mp3"] {
            assert!(root.join(name).exists(), "{name} should be restored");
        }
    }

    #[test]
    fn test_undo_processes_records_in_reverse() {
        let (_guard, root) = setup();
        let log = organize_files(&root, &["first.txt", "second.txt"]);

        let report = UndoEngine::undo(&log);

        assert_eq!(report.entries[0].source_path, root.join("second.txt"));
        assert_eq!(report.entries[1].source_path, root.join("first.txt"));
    }

    #[test]
    fn test_undo_reverse_order_with_reused_name() {
        let (_guard, root) = setup();
        // "a.jpg" moves to Images/a.jpg; a new "a.jpg" arrives and the
        // renamed copy must still find its way back.
        let mut log = organize_files(&root, &["a.jpg"]);
        fs::write(root.join("a.jpg"), "second").expect("Failed to write file");
        MoveExecutor::default().execute(&root.join("a.jpg"), &root, false, &mut log);
        assert!(root.join("Images").join("a (1).jpg").exists());

        let report = UndoEngine::undo(&log);

        // The most recent move is restored first; the older one then finds
        // "a.jpg" occupied and fails without renaming anything.
        assert_eq!(report.restored(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            fs::read_to_string(root.join("a.jpg")).expect("read failed"),
            "second"
        );
        assert!(root.join("Images").join("a.jpg").exists());
    }

    #[test]
    fn test_undo_fails_when_source_is_occupied() {
        let (_guard, root) = setup();
        let log = organize_files(&root, &["test.txt"]);
        fs::write(root.join("test.txt"), "newcomer").expect("Failed to create conflict");

        let report = UndoEngine::undo(&log);

        assert_eq!(report.restored(), 0);
        assert_eq!(report.failed(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, root.join("test.txt"));
        assert!(failures[0].1.contains("already occupied"));
        assert_eq!(
            fs::read_to_string(root.join("test.txt")).expect("read failed"),
            "newcomer"
        );
        assert!(root.join("Documents").join("test.txt").exists());
        let entries: Vec<_> = fs::read_dir(&root)
            .expect("read_dir failed")
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(
            !entries.iter().any(|name| name.contains("(1)")),
            "undo must not create renamed duplicates"
        );
    }

    #[test]
    fn test_undo_fails_when_parent_directory_is_gone() {
        let (_guard, root) = setup();
        let nested = root.join("inbox");
        fs::create_dir(&nested).expect("Failed to create directory");
        let source = nested.join("a.jpg");
        fs::write(&source, "jpeg").expect("Failed to write file");

        let mut log = OperationLog::new(nested.clone(), false);
        MoveExecutor::default().execute(&source, &root, false, &mut log);
        fs::remove_dir(&nested).expect("Failed to remove directory");

        let report = UndoEngine::undo(&log);

        assert_eq!(report.failed(), 1);
        assert!(!nested.exists(), "undo must not recreate directories");
        assert!(root.join("Images").join("a.jpg").exists());
    }

    #[test]
    fn test_undo_twice_is_noop() {
        let (_guard, root) = setup();
        let log = organize_files(&root, &["a.jpg", "b.pdf"]);

        let first = UndoEngine::undo(&log);
        assert_eq!(first.restored(), 2);

        let second = UndoEngine::undo(&log);
        assert_eq!(second.noops(), 2);
        assert_eq!(second.failed(), 0);
        assert!(second.is_complete_success());
        assert!(root.join("a.jpg").exists());
        assert!(root.join("b.pdf").exists());
    }

    #[test]
    fn test_undo_ignores_non_moved_records() {
        let (_guard, root) = setup();
        let mut log = OperationLog::new(root.clone(), false);
        log.append(MoveRecord::failed(
            root.join("locked.txt"),
            root.join("Documents").join("locked.txt"),
            "Documents",
            "Permission denied",
        ));
        log.append(MoveRecord::skipped(
            root.join("dup.jpg"),
            root.join("Images").join("dup.jpg"),
            "Images",
        ));
        assert_eq!(log.count(MoveStatus::Moved), 0);

        let report = UndoEngine::undo(&log);

        assert_eq!(report.total_processed(), 0);
    }

    #[test]
    fn test_category_directories_are_left_empty() {
        let (_guard, root) = setup();
        let log = organize_files(&root, &["a.jpg"]);

        UndoEngine::undo(&log);

        let images = root.join("Images");
        assert!(images.is_dir());
        assert_eq!(fs::read_dir(&images).expect("read_dir failed").count(), 0);
    }
}
