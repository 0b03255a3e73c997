//! Read-only HTTP API over one loaded dashboard session.
//!
//! Provides three GET endpoints:
//! - `/options`: cascading option lists for a partial selection
//! - `/aggregate`: per-region sums and grand total
//! - `/map.svg`: the choropleth for a selection

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::dashboard::Session;
use crate::render::svg::MapStyle;

pub use types::{AggregateResponse, ErrorResponse, FilterQuery, RegionTotal};

/// Immutable application state shared across all request handlers.
///
/// Loaded once before serving and wrapped in `Arc`; every request is a
/// recomputation over read-only data, so no locks are needed.
pub struct AppState {
    /// Loaded table and geometry.
    pub session: Session,
    /// Style used for `/map.svg`.
    pub style: MapStyle,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/options", get(handlers::get_options))
        .route("/aggregate", get(handlers::get_aggregate))
        .route("/map.svg", get(handlers::get_map))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    eprintln!("API server listening on http://{addr}");
    axum::serve(listener, app).await
}
