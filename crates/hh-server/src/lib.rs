//! hh-server: the HTTP collaborator of the sync engine.
//!
//! Serves the browser-side metadata editor from a static directory and
//! accepts full metadata documents through `POST /save-metadata`. The server
//! never runs a sync; it only replaces the document the next sync reads.

pub mod context;
pub mod error;
pub mod router;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use hh_core::config::Config;
use hh_sync::MetadataStore;

pub use context::AppContext;
pub use router::build_router;

/// Start the server and block until Ctrl-C or SIGTERM.
pub async fn start(config: &Config) -> hh_core::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| hh_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext {
        store: Arc::new(MetadataStore::from_config(&config.sync)),
        static_dir: config.server.static_dir.clone(),
    };
    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Serving on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
