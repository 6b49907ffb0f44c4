//! hh-core: shared error type, configuration, and media classification.
//!
//! This crate is the foundational dependency for all other hh-* crates. It
//! knows how a source filename maps to a processing [`Category`] and to the
//! output filename that category produces, but performs no I/O beyond
//! reading the configuration file.

pub mod config;
pub mod error;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use media::*;
