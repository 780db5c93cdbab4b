use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use sporewatch::cell::SharedCell;
use sporewatch::config::MonitorConfig;
use sporewatch::monitor::{Classifier, FetchController, LogisticClassifier, PredictionResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("monitor.json"));
    let config = MonitorConfig::load(&config_path)?;

    log::info!("sporewatch monitor starting up...");

    // Fatal: the monitor refuses to start without a usable classifier.
    let classifier: Arc<dyn Classifier> = Arc::new(
        LogisticClassifier::load(&config.model_path)
            .context("classifier artifact failed to load")?,
    );

    // Read by the presentation layer; replaced wholesale each iteration.
    let results = SharedCell::new(PredictionResult::pending("connecting to station..."));

    let mut fetch = FetchController::new();
    fetch.start(&config, classifier, results.clone())?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    log::info!("shutdown signal received");

    fetch.shutdown().await?;
    Ok(())
}
