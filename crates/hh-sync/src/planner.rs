//! Decides whether a source file needs (re)processing.
//!
//! The decision only compares existence and modification times of the
//! source and its expected output. A failure to read the source's metadata
//! is an error, never an implicit "needs processing".

use std::io;
use std::path::Path;
use std::time::SystemTime;

use hh_core::OutputClass;

/// What has to happen to an output before it is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The output does not exist yet.
    Create,
    /// The output exists but is older than its source.
    Refresh,
    /// The output is current; nothing to do.
    UpToDate,
}

impl Decision {
    /// Whether a conversion or copy has to run.
    pub fn needs_processing(self) -> bool {
        !matches!(self, Decision::UpToDate)
    }

    /// Whether an output file existed when the decision was made.
    pub fn output_existed(self) -> bool {
        !matches!(self, Decision::Create)
    }
}

/// Compare timestamps for one output class.
///
/// Transcoded outputs are current when they are at least as new as the
/// source. Copied outputs are refreshed only when the source is strictly
/// newer. Both rules agree on equal timestamps: the output is kept.
pub fn is_stale(class: OutputClass, source: SystemTime, output: SystemTime) -> bool {
    match class {
        OutputClass::Transcode => output < source,
        OutputClass::Copy => source > output,
    }
}

/// Decide what to do with `output` given `source`.
///
/// # Errors
///
/// Returns an I/O error if the source cannot be stat'ed, or if the output
/// exists but its metadata cannot be read.
pub fn decide(source: &Path, output: &Path, class: OutputClass) -> hh_core::Result<Decision> {
    let source_mtime = std::fs::metadata(source)?.modified()?;

    let output_mtime = match std::fs::metadata(output) {
        Ok(meta) => meta.modified()?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Decision::Create),
        Err(e) => return Err(e.into()),
    };

    if is_stale(class, source_mtime, output_mtime) {
        Ok(Decision::Refresh)
    } else {
        Ok(Decision::UpToDate)
    }
}

/// `true` if `output` is missing or older than `source`.
pub fn needs_processing(source: &Path, output: &Path, class: OutputClass) -> hh_core::Result<bool> {
    decide(source, output, class).map(Decision::needs_processing)
}
