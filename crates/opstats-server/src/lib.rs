//! HTTP surface for opstats.
//!
//! Exposes the upload endpoint and the two read endpoints over axum, maps
//! [`opstats_core::error::OpstatsError`] values onto HTTP responses, and owns
//! the server lifecycle including graceful Ctrl-C shutdown.

pub mod error;
pub mod handlers;
pub mod routes;

use std::net::SocketAddr;

use opstats_data::store::Store;
use tracing::info;

pub use opstats_core as core;
pub use opstats_data as data;

// ── AppState ──────────────────────────────────────────────────────────────────

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

/// Bind `addr` and serve the API until Ctrl-C.
pub async fn serve(addr: SocketAddr, store: Store) -> anyhow::Result<()> {
    let app = routes::router(AppState { store });
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl+C received; shutting down");
    }
}
