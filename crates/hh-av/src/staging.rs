//! Staged outputs for conversion actions.
//!
//! A [`StagedOutput`] reserves a hidden temporary file next to the final
//! output path. The external tool writes into the staged path; only
//! [`StagedOutput::commit`] moves it over the final path. Dropping an
//! uncommitted stage removes the temporary file, so a failed or timed-out
//! conversion never leaves a truncated output behind.

use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};

/// A temporary file in the destination directory awaiting promotion.
///
/// # Example
///
/// ```no_run
/// use hh_av::StagedOutput;
///
/// let stage = StagedOutput::new(std::path::Path::new("sources/cat.webm")).unwrap();
/// // ... let the tool write to stage.path() ...
/// stage.commit().unwrap();
/// ```
#[derive(Debug)]
pub struct StagedOutput {
    temp: TempPath,
    destination: PathBuf,
}

impl StagedOutput {
    /// Reserve a staged file for `destination`.
    ///
    /// The staged file lives in the same directory (so the final rename does
    /// not cross filesystems), starts with `.` and keeps the destination's
    /// extension so tools that infer the container from the name still work.
    pub fn new(destination: &Path) -> hh_core::Result<Self> {
        let dir = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let suffix = destination
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut builder = Builder::new();
        builder.prefix(".hh-stage-").suffix(&suffix);
        // Published files must stay readable by the static file server.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }

        let file = builder.tempfile_in(&dir).map_err(|e| {
            hh_core::Error::tool("staging", format!("failed to create staged file: {e}"))
        })?;

        Ok(Self {
            temp: file.into_temp_path(),
            destination: destination.to_path_buf(),
        })
    }

    /// Path the tool should write to.
    pub fn path(&self) -> &Path {
        &self.temp
    }

    /// The final output path.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Move the staged file over the destination, replacing any previous
    /// output. Returns the destination path.
    ///
    /// # Errors
    ///
    /// Returns an error if the staged file is missing or the rename fails.
    pub fn commit(self) -> hh_core::Result<PathBuf> {
        if !self.temp.exists() {
            return Err(hh_core::Error::tool(
                "staging",
                format!("staged file does not exist: {}", self.temp.display()),
            ));
        }

        self.temp
            .persist(&self.destination)
            .map_err(|e| hh_core::Error::Io { source: e.error })?;

        Ok(self.destination)
    }
}
