//! Error-to-HTTP response conversion.
//!
//! Every failure is answered with `{"ok": false, "error": "..."}` and the
//! status from [`hh_core::Error::http_status`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(hh_core::Error);

impl From<hh_core::Error> for AppError {
    fn from(e: hh_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Server error in handler");
        }

        let body = json!({
            "ok": false,
            "error": self.0.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
