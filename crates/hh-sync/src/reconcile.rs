//! Removal of published outputs that no source backs any more.
//!
//! The deletion criterion is an exact filename match against the expected
//! output set; sub-directories of the output directory are never touched.
//! A failed deletion is logged and recorded, and the pass continues.

use std::collections::BTreeSet;
use std::path::Path;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Filenames that were deleted, in name order.
    pub deleted: Vec<String>,
    /// Filenames that should have been deleted but could not be, with the
    /// error message.
    pub failed: Vec<(String, String)>,
}

impl ReconcileReport {
    /// Number of outputs actually removed.
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// List the files in `output_dir` that are not in `expected`, without
/// deleting anything. A missing directory has no stale files.
pub fn stale_outputs(output_dir: &Path, expected: &BTreeSet<String>) -> hh_core::Result<Vec<String>> {
    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut stale = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Error reading output directory entry");
                continue;
            }
        };

        if !entry.path().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = ?entry.path(), "Skipping output with non UTF-8 name");
            continue;
        };

        if !expected.contains(&name) {
            stale.push(name);
        }
    }

    stale.sort();
    Ok(stale)
}

/// Delete every file in `output_dir` whose name is not in `expected`.
///
/// # Errors
///
/// Only fails if the directory itself cannot be listed; individual
/// deletion failures land in [`ReconcileReport::failed`].
pub fn remove_stale(output_dir: &Path, expected: &BTreeSet<String>) -> hh_core::Result<ReconcileReport> {
    let mut report = ReconcileReport::default();

    for name in stale_outputs(output_dir, expected)? {
        let path = output_dir.join(&name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(file = %name, "Deleted stale output");
                report.deleted.push(name);
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Failed to delete stale output");
                report.failed.push((name, e.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn expected(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn deletes_only_unexpected_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["cat.webm", "dog.webp", "old.webm", ".hh-stage-abc.webm"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let report = remove_stale(dir.path(), &expected(&["cat.webm", "dog.webp"])).unwrap();

        assert_eq!(report.deleted, vec![".hh-stage-abc.webm", "old.webm"]);
        assert!(report.failed.is_empty());
        assert_eq!(report.deleted_count(), 2);
        assert!(dir.path().join("cat.webm").exists());
        assert!(dir.path().join("dog.webp").exists());
        assert!(!dir.path().join("old.webm").exists());
    }

    #[test]
    fn subdirectories_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("thumbs")).unwrap();
        fs::write(dir.path().join("thumbs").join("a.jpg"), b"x").unwrap();

        let report = remove_stale(dir.path(), &BTreeSet::new()).unwrap();

        assert!(report.deleted.is_empty());
        assert!(dir.path().join("thumbs").join("a.jpg").exists());
    }

    #[test]
    fn renamed_source_leaves_stale_output() {
        // dog.png -> dog.webp was published; the source became dog.gif.
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dog.webp"), b"x").unwrap();
        fs::write(dir.path().join("dog.gif"), b"x").unwrap();

        let stale = stale_outputs(dir.path(), &expected(&["dog.gif"])).unwrap();
        assert_eq!(stale, vec!["dog.webp"]);
    }

    #[test]
    fn missing_directory_has_nothing_stale() {
        let dir = tempfile::tempdir().unwrap();
        let stale = stale_outputs(&dir.path().join("absent"), &BTreeSet::new()).unwrap();
        assert!(stale.is_empty());
    }

    #[test]
    fn dry_listing_does_not_delete() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.webm"), b"x").unwrap();

        let stale = stale_outputs(dir.path(), &BTreeSet::new()).unwrap();
        assert_eq!(stale, vec!["old.webm"]);
        assert!(dir.path().join("old.webm").exists());
    }
}
