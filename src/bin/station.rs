use std::path::PathBuf;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use sporewatch::config::StationConfig;
use sporewatch::station::{
    camera::StillCameraSource, sensor::SerialLineSource, serve, IngestController, StationCells,
    StationState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("station.json"));
    let config = StationConfig::load(&config_path)?;

    log::info!("sporewatch station starting up...");

    let cells = StationCells::new();
    let shutdown = CancellationToken::new();

    // A dead serial port disables live readings but not the rest of the
    // station.
    let sensor_source = match SerialLineSource::open(&config.serial_device).await {
        Ok(source) => Some(source),
        Err(err) => {
            log::error!(
                "cannot open serial device {}; live sensor cell will stay empty: {err:#}",
                config.serial_device.display()
            );
            None
        }
    };
    let camera_source = StillCameraSource::new(config.camera_spool.clone());

    let mut ingest = IngestController::new();
    ingest.start(sensor_source, camera_source, &cells, &config, &shutdown)?;

    let state = StationState {
        cells,
        stream_interval: config.stream_interval(),
        shutdown: shutdown.clone(),
    };
    let server = tokio::spawn(serve(config.bind_addr.clone(), state));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    log::info!("shutdown signal received");

    shutdown.cancel();
    ingest.shutdown().await?;
    server.await.context("server task failed to join")??;
    Ok(())
}
