use std::time::Duration;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;

use super::{routes, StationCells};

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct StationState {
    pub cells: StationCells,
    pub stream_interval: Duration,
    pub shutdown: CancellationToken,
}

pub fn router(state: StationState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/sensor", get(routes::sensor_api))
        .route("/capture", get(routes::capture))
        .route("/api/captured_data", get(routes::captured_data))
        .route("/video_feed", get(routes::video_feed))
        .with_state(state)
}

/// Binds and serves the station API until the shutdown token fires.
pub async fn serve(bind_addr: String, state: StationState) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    log::info!("station listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("station http server failed")
}
