//! The metadata document: tags, per-file assignments, and the published
//! file list.
//!
//! The document is loaded once per run, reconciled in memory against the
//! final output set, and written back exactly once through a temporary file
//! and a rename. Assignment payloads belong to the metadata editor and are
//! carried as opaque JSON.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The persisted reconciliation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataDocument {
    /// Labels offered by the editor. Never modified by a sync run.
    pub tags: Vec<String>,
    /// Output filename -> editor-owned payload.
    pub assignments: BTreeMap<String, Value>,
    /// The published output set, sorted.
    pub files: Vec<String>,
    /// Any other top-level keys, preserved as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MetadataDocument {
    /// A fresh document with the given tags and nothing else.
    pub fn with_tags(tags: Vec<String>) -> Self {
        Self {
            tags,
            assignments: BTreeMap::new(),
            files: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Replace `files` with `final_files` (sorted) and drop every assignment
    /// whose key is not among them. Tags are left untouched.
    pub fn reconcile(mut self, final_files: &BTreeSet<String>) -> Self {
        self.files = final_files.iter().cloned().collect();

        let before = self.assignments.len();
        self.assignments.retain(|name, _| final_files.contains(name));
        let pruned = before - self.assignments.len();
        if pruned > 0 {
            tracing::info!("Pruned {pruned} orphaned assignment(s)");
        }

        self
    }
}

/// On-disk shape; every known key is optional so it can be backfilled.
#[derive(Deserialize)]
struct StoredDocument {
    tags: Option<Vec<String>>,
    assignments: Option<BTreeMap<String, Value>>,
    files: Option<Vec<String>>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// Reads and writes the metadata document at a fixed path.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
    default_tags: Vec<String>,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>, default_tags: Vec<String>) -> Self {
        Self {
            path: path.into(),
            default_tags,
        }
    }

    /// A store at the configured metadata path with the configured default
    /// tags.
    pub fn from_config(config: &hh_core::config::SyncConfig) -> Self {
        Self::new(config.metadata_path.clone(), config.default_tags.clone())
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The document used when nothing usable is on disk.
    pub fn default_document(&self) -> MetadataDocument {
        MetadataDocument::with_tags(self.default_tags.clone())
    }

    /// Parse a document, backfilling missing keys.
    ///
    /// # Errors
    ///
    /// Returns [`hh_core::Error::Validation`] if the text is not a JSON
    /// object or a known key has the wrong shape.
    pub fn parse(&self, contents: &str) -> hh_core::Result<MetadataDocument> {
        let stored: StoredDocument = serde_json::from_str(contents)
            .map_err(|e| hh_core::Error::Validation(format!("metadata parse error: {e}")))?;

        Ok(MetadataDocument {
            tags: stored.tags.unwrap_or_else(|| self.default_tags.clone()),
            assignments: stored.assignments.unwrap_or_default(),
            files: stored.files.unwrap_or_default(),
            extra: stored.extra,
        })
    }

    /// Load the document.
    ///
    /// A missing or malformed file yields [`Self::default_document`].
    ///
    /// # Errors
    ///
    /// Any other read failure (e.g. permission denied) is returned rather
    /// than silently replaced, since the document would be overwritten at
    /// the end of the run.
    pub fn load(&self) -> hh_core::Result<MetadataDocument> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(self.parse(&contents).unwrap_or_else(|e| {
                tracing::warn!("{} is malformed, starting fresh: {e}", self.path.display());
                self.default_document()
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No metadata at {}; starting fresh", self.path.display());
                Ok(self.default_document())
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!("{} is not UTF-8, starting fresh: {e}", self.path.display());
                Ok(self.default_document())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write `doc`, fully replacing the previous content.
    pub fn persist(&self, doc: &MetadataDocument) -> hh_core::Result<()> {
        let bytes = to_pretty_json(doc)?;
        write_atomic(&self.path, &bytes)?;
        tracing::debug!("Wrote {} ({} files)", self.path.display(), doc.files.len());
        Ok(())
    }

    /// Write an arbitrary JSON value in the same format as [`Self::persist`].
    ///
    /// Used by the HTTP editor endpoint, which owns the document shape.
    pub fn write_raw(&self, value: &Value) -> hh_core::Result<()> {
        let bytes = to_pretty_json(value)?;
        write_atomic(&self.path, &bytes)
    }
}

/// Serialize with four-space indentation and a trailing newline. Non-ASCII
/// text is written verbatim.
fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> hh_core::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| hh_core::Error::Internal(format!("metadata serialize error: {e}")))?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write `bytes` to a temporary file beside `path`, then rename it over
/// `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> hh_core::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".metadata-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }

    let mut file = builder.tempfile_in(&dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path)
        .map_err(|e| hh_core::Error::Io { source: e.error })?;
    Ok(())
}
