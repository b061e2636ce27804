//! HTTP endpoint serving `/metrics`

use super::PrometheusSink;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;

/// Path scraped by Prometheus
pub const METRICS_PATH: &str = "/metrics";

pub fn router(sink: Arc<PrometheusSink>) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics))
        .with_state(sink)
}

async fn metrics(State(sink): State<Arc<PrometheusSink>>) -> Response {
    match sink.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, sink.content_type())], body).into_response(),
        Err(e) => {
            error!("Cannot encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve the metrics endpoint until the server fails
pub async fn serve(listen: SocketAddr, sink: Arc<PrometheusSink>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Error while starting Prometheus HTTP server on {}", listen))?;

    info!("Serving prometheus metrics on {}{}", listen, METRICS_PATH);
    axum::serve(listener, router(sink))
        .await
        .context("Prometheus HTTP server failed")
}
