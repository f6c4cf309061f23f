/// Move executor: relocates one file into its category directory.
///
/// Each call classifies a file, resolves a conflict-free destination inside
/// `target_root/<category>`, performs (or, in a dry run, simulates) the move
/// and appends exactly one [`MoveRecord`] to the caller's log. A failed move
/// is a `Failed` record, never an error: the source file is left untouched
/// and the caller carries on with the next file.
use crate::classifier::{Classifier, FALLBACK_CATEGORY};
use crate::conflict;
use crate::operation_log::{MoveRecord, MoveStatus, OperationLog};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Moves `from` to `to`.
///
/// Uses `fs::rename`; when the two paths are on different filesystems it
/// falls back to copy, size check and removal of the source. A failed
/// fallback removes the partial copy so the source remains the only copy.
pub fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(e) => Err(e),
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let source_size = fs::metadata(from)?.len();
    let result = fs::copy(from, to).and_then(|_| verify_and_remove(from, to, source_size));
    // Source still in place: the copy is redundant.
    if result.is_err() && from.exists() {
        let _ = fs::remove_file(to);
    }
    result
}

fn verify_and_remove(from: &Path, to: &Path, source_size: u64) -> io::Result<()> {
    let copied_size = fs::metadata(to)?.len();
    if copied_size != source_size {
        return Err(io::Error::other(format!(
            "copy verification failed: source {} bytes, destination {} bytes",
            source_size, copied_size
        )));
    }

    match fs::remove_file(from) {
        // The verified copy is now the only one.
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Lossy UTF-8 form of a path, for records of paths that cannot be stored
/// as they are.
fn lossy(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().into_owned())
}

/// Returns true if both files have the same size and bytes.
fn same_contents(a: &Path, b: &Path) -> io::Result<bool> {
    let (meta_a, meta_b) = (fs::metadata(a)?, fs::metadata(b)?);
    if !meta_b.is_file() || meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(fs::read(a)? == fs::read(b)?)
}

/// Performs single-file relocations for an organize session.
#[derive(Debug, Clone, Default)]
pub struct MoveExecutor {
    classifier: Classifier,
    skip_identical: bool,
}

impl MoveExecutor {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            skip_identical: false,
        }
    }

    /// When enabled, a file whose identical copy already sits at the
    /// destination is recorded as `Skipped` instead of being renamed.
    pub fn with_skip_identical(mut self, skip_identical: bool) -> Self {
        self.skip_identical = skip_identical;
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Relocates (or plans to relocate) one file and records the outcome.
    ///
    /// # Arguments
    ///
    /// * `source_path` - Absolute path of a regular, non-hidden file
    /// * `target_root` - Directory in which category subdirectories live
    /// * `dry_run` - If true, nothing on disk changes and the record is `Planned`
    /// * `log` - The session log; exactly one record is appended to it
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use foldertidy::file_organizer::MoveExecutor;
    /// use foldertidy::operation_log::OperationLog;
    /// use std::path::Path;
    ///
    /// let root = Path::new("/home/user/Downloads");
    /// let mut log = OperationLog::new(root.to_path_buf(), false);
    /// let record = MoveExecutor::default().execute(&root.join("a.jpg"), root, false, &mut log);
    /// println!("{} -> {}", record.source_path().display(), record.destination_path().display());
    /// ```
    pub fn execute<'log>(
        &self,
        source_path: &Path,
        target_root: &Path,
        dry_run: bool,
        log: &'log mut OperationLog,
    ) -> &'log MoveRecord {
        let record = self.attempt(source_path, target_root, dry_run, log);

        match record.status() {
            MoveStatus::Failed => tracing::warn!(
                source = %record.source_path().display(),
                error = record.error_detail().unwrap_or_default(),
                "failed to organize file"
            ),
            status => tracing::info!(
                source = %record.source_path().display(),
                destination = %record.destination_path().display(),
                category = record.category(),
                ?status,
                "organized file"
            ),
        }

        log.append(record)
    }

    fn attempt(
        &self,
        source_path: &Path,
        target_root: &Path,
        dry_run: bool,
        log: &OperationLog,
    ) -> MoveRecord {
        let Some(file_name) = source_path.file_name() else {
            return MoveRecord::failed(
                lossy(source_path),
                lossy(target_root),
                FALLBACK_CATEGORY,
                "file has no name component",
            );
        };
        let category = self
            .classifier
            .classify(&file_name.to_string_lossy())
            .to_string();
        let category_dir = target_root.join(&category);
        let desired = category_dir.join(file_name);

        // Paths the log cannot store as UTF-8 are never moved.
        if source_path.to_str().is_none() || target_root.to_str().is_none() {
            return MoveRecord::failed(
                lossy(source_path),
                lossy(&desired),
                category,
                "path is not valid UTF-8 and cannot be recorded for undo",
            );
        }

        if !dry_run && let Err(e) = fs::create_dir_all(&category_dir) {
            return MoveRecord::failed(
                source_path.to_path_buf(),
                desired,
                category,
                format!("failed to create {}: {}", category_dir.display(), e),
            );
        }

        if self.skip_identical
            && desired.exists()
            && same_contents(source_path, &desired).unwrap_or(false)
        {
            return MoveRecord::skipped(source_path.to_path_buf(), desired, category);
        }

        let reserved: HashSet<PathBuf> = if dry_run {
            log.with_status(MoveStatus::Planned)
                .map(|r| r.destination_path().to_path_buf())
                .collect()
        } else {
            HashSet::new()
        };

        let final_name = match conflict::resolve_reserving(&category_dir, file_name, &reserved) {
            Ok(name) => name,
            Err(e) => {
                return MoveRecord::failed(
                    source_path.to_path_buf(),
                    desired,
                    category,
                    format!("failed to check destination: {}", e),
                );
            }
        };
        let destination = category_dir.join(&final_name);

        if dry_run {
            return MoveRecord::planned(source_path.to_path_buf(), destination, category);
        }

        match relocate(source_path, &destination) {
            Ok(()) => MoveRecord::moved(source_path.to_path_buf(), destination, category),
            Err(e) => MoveRecord::failed(source_path.to_path_buf(), destination, category, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory");
        (temp_dir, root)
    }

    #[test]
    fn test_execute_moves_into_category_directory() {
        let (_guard, root) = setup();
        let source = root.join("a.jpg");
        fs::write(&source, "jpeg").expect("Failed to write test file");

        let mut log = OperationLog::new(root.clone(), false);
        let record = MoveExecutor::default().execute(&source, &root, false, &mut log);

        assert_eq!(record.status(), MoveStatus::Moved);
        assert_eq!(record.category(), "Images");
        assert_eq!(record.destination_path(), root.join("Images").join("a.jpg"));
        assert!(!source.exists());
        assert!(root.join("Images").join("a.jpg").exists());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_execute_uses_existing_category_directory() {
        let (_guard, root) = setup();
        fs::create_dir(root.join("Documents")).expect("Failed to create directory");
        let source = root.join("b.pdf");
        fs::write(&source, "pdf").expect("Failed to write test file");

        let mut log = OperationLog::new(root.clone(), false);
        let record = MoveExecutor::default().execute(&source, &root, false, &mut log);

        assert_eq!(record.status(), MoveStatus::Moved);
        assert!(root.join("Documents").join("b.pdf").exists());
    }

    #[test]
    fn test_execute_renames_on_conflict() {
        let (_guard, root) = setup();
        fs::create_dir(root.join("Images")).expect("Failed to create directory");
        fs::write(root.join("Images").join("a.jpg"), "old").expect("Failed to write file");
        let source = root.join("a.jpg");
        fs::write(&source, "new").expect("Failed to write file");

        let mut log = OperationLog::new(root.clone(), false);
        let record = MoveExecutor::default().execute(&source, &root, false, &mut log);

        assert_eq!(record.status(), MoveStatus::Moved);
        assert_eq!(
            record.destination_path(),
            root.join("Images").join("a (1).jpg")
        );
        assert_eq!(
            fs::read_to_string(root.join("Images").join("a.jpg")).expect("read failed"),
            "old"
        );
        assert_eq!(
            fs::read_to_string(root.join("Images").join("a (1).jpg")).expect("read failed"),
            "new"
        );
    }

    #[test]
    fn test_dry_run_does_not_touch_disk() {
        let (_guard, root) = setup();
        let source = root.join("a.jpg");
        fs::write(&source, "jpeg").expect("Failed to write test file");

        let mut log = OperationLog::new(root.clone(), true);
        let record = MoveExecutor::default().execute(&source, &root, true, &mut log);

        assert_eq!(record.status(), MoveStatus::Planned);
        assert!(source.exists());
        assert!(!root.join("Images").exists());
    }

    #[test]
    fn test_dry_run_keeps_planned_destinations_unique() {
        let (_guard, root) = setup();
        fs::create_dir(root.join("Images")).expect("Failed to create directory");
        fs::write(root.join("Images").join("a.jpg"), "old").expect("Failed to write file");
        fs::write(root.join("a (1).jpg"), "x").expect("Failed to write file");
        fs::write(root.join("a.jpg"), "y").expect("Failed to write file");

        let executor = MoveExecutor::default();
        let mut log = OperationLog::new(root.clone(), true);
        executor.execute(&root.join("a (1).jpg"), &root, true, &mut log);
        executor.execute(&root.join("a.jpg"), &root, true, &mut log);

        let destinations: HashSet<_> = log
            .records()
            .iter()
            .map(|r| r.destination_path().to_path_buf())
            .collect();
        assert_eq!(destinations.len(), 2);
        assert!(destinations.contains(&root.join("Images").join("a (1).jpg")));
        assert!(destinations.contains(&root.join("Images").join("a (2).jpg")));
    }

    #[test]
    fn test_missing_source_is_recorded_as_failure() {
        let (_guard, root) = setup();
        let source = root.join("vanished.txt");

        let mut log = OperationLog::new(root.clone(), false);
        let record = MoveExecutor::default().execute(&source, &root, false, &mut log);

        assert_eq!(record.status(), MoveStatus::Failed);
        assert!(record.error_detail().is_some());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_uncreatable_category_directory_is_recorded_as_failure() {
        let (_guard, root) = setup();
        // A plain file where the category directory should go.
        fs::write(root.join("Images"), "not a directory").expect("Failed to write file");
        let source = root.join("a.jpg");
        fs::write(&source, "jpeg").expect("Failed to write file");

        let mut log = OperationLog::new(root.clone(), false);
        let record = MoveExecutor::default().execute(&source, &root, false, &mut log);

        assert_eq!(record.status(), MoveStatus::Failed);
        assert!(source.exists(), "source must stay in place");
    }

    #[test]
    fn test_skip_identical_records_skipped() {
        let (_guard, root) = setup();
        fs::create_dir(root.join("Images")).expect("Failed to create directory");
        fs::write(root.join("Images").join("a.jpg"), "same").expect("Failed to write file");
        let source = root.join("a.jpg");
        fs::write(&source, "same").expect("Failed to write file");

        let executor = MoveExecutor::default().with_skip_identical(true);
        let mut log = OperationLog::new(root.clone(), false);
        let record = executor.execute(&source, &root, false, &mut log);

        assert_eq!(record.status(), MoveStatus::Skipped);
        assert!(source.exists());
        assert!(!root.join("Images").join("a (1).jpg").exists());
    }

    #[test]
    fn test_skip_identical_still_renames_different_content() {
        let (_guard, root) = setup();
        fs::create_dir(root.join("Images")).expect("Failed to create directory");
        fs::write(root.join("Images").join("a.jpg"), "one").expect("Failed to write file");
        let source = root.join("a.jpg");
        fs::write(&source, "two").expect("Failed to write file");

        let executor = MoveExecutor::default().with_skip_identical(true);
        let mut log = OperationLog::new(root.clone(), false);
        let record = executor.execute(&source, &root, false, &mut log);

        assert_eq!(record.status(), MoveStatus::Moved);
        assert_eq!(
            record.destination_path(),
            root.join("Images").join("a (1).jpg")
        );
    }

    #[test]
    fn test_relocate_moves_file() {
        let (_guard, root) = setup();
        let from = root.join("from.txt");
        let to = root.join("to.txt");
        fs::write(&from, "content").expect("Failed to write file");

        relocate(&from, &to).expect("relocate failed");

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).expect("read failed"), "content");
    }

    #[test]
    fn test_copy_then_remove_moves_file() {
        let (_guard, root) = setup();
        let from = root.join("from.bin");
        let to = root.join("to.bin");
        fs::write(&from, b"\x00\x01payload").expect("Failed to write file");

        copy_then_remove(&from, &to).expect("copy fallback failed");

        assert!(!from.exists());
        assert_eq!(fs::read(&to).expect("read failed"), b"\x00\x01payload");
    }

    #[test]
    fn test_failed_copy_leaves_no_destination() {
        let (_guard, root) = setup();
        let from = root.join("folder");
        fs::create_dir(&from).expect("Failed to create directory");
        let to = root.join("copy");

        assert!(copy_then_remove(&from, &to).is_err());
        assert!(from.is_dir());
        assert!(!to.exists());
    }

    #[test]
    fn test_verification_failure_keeps_source() {
        let (_guard, root) = setup();
        let from = root.join("from.txt");
        let to = root.join("to.txt");
        fs::write(&from, "content").expect("Failed to write file");

        // Destination never written: size lookup fails.
        assert!(verify_and_remove(&from, &to, 7).is_err());
        assert!(from.exists());

        fs::write(&to, "cont").expect("Failed to write file");
        assert!(verify_and_remove(&from, &to, 7).is_err());
        assert!(from.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_is_failed_and_left_in_place() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_guard, root) = setup();
        let source = root.join(OsStr::from_bytes(b"caf\xe9.jpg"));
        fs::write(&source, "jpeg").expect("Failed to write test file");

        let mut log = OperationLog::new(root.clone(), false);
        let record = MoveExecutor::default().execute(&source, &root, false, &mut log);

        assert_eq!(record.status(), MoveStatus::Failed);
        assert_eq!(record.category(), "Images");
        assert!(record.error_detail().is_some_and(|d| d.contains("UTF-8")));
        assert!(source.exists());
        assert!(!root.join("Images").exists());
        assert!(log.finalize().is_ok());
    }
}
