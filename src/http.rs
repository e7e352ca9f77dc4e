//! Scrape endpoint for the bot's moderation counters.
//!
//! `/metrics` exposes the prometheus registry; `/health` answers as long as
//! the runtime is alive. Disabled when `metrics_port` is 0.

use axum::{Router, routing::get};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

fn router() -> Router {
    Router::new()
        .route("/metrics", get(|| async { crate::metrics::gather_metrics() }))
        .route("/health", get(|| async { "ok" }))
}

/// Serve the scrape routes on an already bound listener until it fails.
pub async fn serve(listener: TcpListener) {
    if let Err(e) = axum::serve(listener, router()).await {
        error!(error = %e, "Metrics endpoint stopped");
    }
}

/// Bind `0.0.0.0:port` and serve. Meant to be spawned.
pub async fn run_http_server(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!(%addr, "Metrics endpoint listening");
            serve(listener).await;
        }
        Err(e) => error!(%addr, error = %e, "Metrics endpoint could not bind"),
    }
}
