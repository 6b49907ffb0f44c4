//! Axum router construction.

use axum::routing::post;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::routes;

/// `POST /save-metadata` plus static files from `ctx.static_dir`; `/`
/// serves `index.html`.
pub fn build_router(ctx: AppContext) -> Router {
    let static_files =
        ServeDir::new(&ctx.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/save-metadata", post(routes::metadata::save_metadata))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
