//! Destination name conflict resolution.
//!
//! When a file is about to land on a name that is already taken, the
//! resolver tries `stem (1).ext`, `stem (2).ext`, ... until it finds a free
//! name. The search is a check-then-use sequence: it is not atomic against
//! another process creating entries in the same directory.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Splits a file name into stem and extension (dot included).
///
/// A leading dot does not start an extension, so `.bashrc` has none.
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    }
}

/// [`split_name`] for names that may not be valid UTF-8. Such names keep
/// their bytes intact and get the counter appended at the end.
fn split_os_name(name: &OsStr) -> (OsString, OsString) {
    match name.to_str() {
        Some(name) => {
            let (stem, extension) = split_name(name);
            (stem.into(), extension.into())
        }
        None => (name.to_os_string(), OsString::new()),
    }
}

/// Returns whether any entry occupies `path`, dangling symlinks included.
fn is_occupied(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Returns a name under `destination_dir` that no entry currently uses.
///
/// The desired name is returned unchanged when it is free. A directory
/// that does not exist yet has every name free.
///
/// # Examples
///
/// ```no_run
/// use foldertidy::conflict::resolve;
/// use std::path::Path;
///
/// // With "Images/a.jpg" already present:
/// let name = resolve(Path::new("Images"), "a.jpg").unwrap();
/// assert_eq!(name, "a (1).jpg");
/// ```
pub fn resolve(destination_dir: &Path, desired_name: impl AsRef<OsStr>) -> io::Result<OsString> {
    resolve_reserving(destination_dir, desired_name, &HashSet::new())
}

/// Like [`resolve`], but also treats every path in `reserved` as taken.
///
/// Dry runs use this to keep planned destinations unique without touching
/// the filesystem.
pub fn resolve_reserving(
    destination_dir: &Path,
    desired_name: impl AsRef<OsStr>,
    reserved: &HashSet<PathBuf>,
) -> io::Result<OsString> {
    let desired_name = desired_name.as_ref();
    let taken = |name: &OsStr| -> io::Result<bool> {
        let candidate = destination_dir.join(name);
        Ok(reserved.contains(&candidate) || is_occupied(&candidate)?)
    };

    if !taken(desired_name)? {
        return Ok(desired_name.to_os_string());
    }

    let (stem, extension) = split_os_name(desired_name);
    let mut counter: u64 = 1;
    loop {
        let mut candidate = stem.clone();
        candidate.push(format!(" ({counter})"));
        candidate.push(&extension);
        if !taken(&candidate)? {
            tracing::debug!(
                desired = ?desired_name,
                resolved = ?candidate,
                "renamed to avoid a name conflict"
            );
            return Ok(candidate);
        }
        counter += 1;
    }
}
