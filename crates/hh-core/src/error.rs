//! Unified error type for horsehub.
//!
//! All crates funnel their failures into [`Error`]. The HTTP collaborator
//! derives a status code via [`Error::http_status`]; the sync engine inspects
//! the tool variants to classify per-file conversion failures.

use std::time::Duration;

/// Unified error type covering all failure modes in horsehub.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input data (config, request body, metadata) failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A required external tool is not installed or not executable.
    #[error("Tool not found: {tool}")]
    ToolMissing {
        /// Name of the tool that could not be located.
        tool: String,
    },

    /// An external tool ran but exited unsuccessfully.
    #[error("Tool error [{tool}]: exited with {}: {message}", exit_label(.code))]
    ToolExit {
        /// Name of the tool that failed.
        tool: String,
        /// Exit code, or `None` when the process was killed by a signal.
        code: Option<i32>,
        /// Captured stderr, trimmed.
        message: String,
    },

    /// An external tool did not finish within its time budget.
    #[error("Tool error [{tool}]: timed out after {timeout:?}")]
    ToolTimeout {
        /// Name of the tool that was killed.
        tool: String,
        /// The budget that expired.
        timeout: Duration,
    },

    /// Any other failure while driving an external tool (spawn, wait).
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "signal".to_string(),
    }
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Io { .. } => 500,
            Error::ToolMissing { .. } => 503,
            Error::ToolExit { .. } => 502,
            Error::ToolTimeout { .. } => 504,
            Error::Tool { .. } => 502,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::ToolMissing`].
    pub fn tool_missing(tool: impl Into<String>) -> Self {
        Error::ToolMissing { tool: tool.into() }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
