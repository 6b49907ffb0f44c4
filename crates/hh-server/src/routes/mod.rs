//! Route handlers.

pub mod metadata;
