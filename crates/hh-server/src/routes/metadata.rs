//! Metadata document upload.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::AppError;

/// POST /save-metadata: replace the metadata document with the body.
///
/// The body must be a JSON object or array; it is stored as-is.
pub async fn save_metadata(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let document: Value = serde_json::from_slice(&body)
        .map_err(|e| hh_core::Error::Validation(format!("invalid JSON body: {e}")))?;

    if !(document.is_object() || document.is_array()) {
        return Err(hh_core::Error::Validation(
            "expected a JSON object or array in the body".into(),
        )
        .into());
    }

    let store = ctx.store.clone();
    tokio::task::spawn_blocking(move || store.write_raw(&document))
        .await
        .map_err(|e| hh_core::Error::Internal(format!("metadata writer panicked: {e}")))??;

    tracing::info!("Saved {}", ctx.store.path().display());
    Ok(Json(json!({"ok": true, "message": "metadata saved"})))
}
