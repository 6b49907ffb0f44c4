//! Shared state for route handlers.

use std::path::PathBuf;
use std::sync::Arc;

use hh_sync::MetadataStore;

/// Handed to every handler via axum state.
#[derive(Clone)]
pub struct AppContext {
    /// Writer for the metadata document.
    pub store: Arc<MetadataStore>,
    /// Root of the static files (the editor page and the published media).
    pub static_dir: PathBuf,
}
