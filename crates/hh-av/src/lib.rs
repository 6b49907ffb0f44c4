//! # hh-av
//!
//! External tool management and media conversion actions for horsehub.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache the path to
//!   ffmpeg, honouring a configured override.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Staged outputs** ([`StagedOutput`]) -- a temporary file next to the
//!   final output that only replaces it once the tool succeeded.
//! - **Action functions** ([`actions`]) -- video transcode, image transcode,
//!   and modification-time preserving copy.

pub mod actions;
pub mod command;
pub mod staging;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use staging::StagedOutput;
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};

// Action functions
pub use actions::{copy_preserving_mtime, transcode_image, transcode_video};
