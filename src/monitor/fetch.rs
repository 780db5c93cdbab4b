use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cell::SharedCell;
use crate::config::MonitorConfig;
use crate::error::Error;
use crate::frame::FrameBuffer;
use crate::wire::{CaptureBody, CapturedDataResponse};

use super::classify::Classifier;
use super::prediction::PredictionResult;

pub const WAITING_STATUS: &str = "waiting for capture";

/// HTTP client for the station's capture endpoint, with a bounded
/// per-request timeout.
pub struct CaptureClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CaptureClient {
    pub fn new(station_url: &str, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Transport(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/captured_data", station_url.trim_end_matches('/')),
        })
    }

    /// Fetches the frozen capture. A 404 or an OK body with no frame means
    /// nothing has been frozen yet; everything else network-shaped is a
    /// transport failure.
    pub async fn fetch_capture(&self) -> Result<CaptureBody, Error> {
        let response = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|err| Error::Transport(err.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NoCaptureYet);
        }
        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body: CapturedDataResponse = response
            .json()
            .await
            .map_err(|err| Error::Transport(format!("malformed response: {err}")))?;
        let data = body.data.ok_or(Error::NoCaptureYet)?;
        if data.image_data.is_empty() {
            return Err(Error::NoCaptureYet);
        }
        Ok(data)
    }
}

/// One fetch-and-classify iteration. Every failure mode downgrades to a
/// descriptive status; nothing escapes past the loop boundary.
pub async fn perform_fetch(
    client: &CaptureClient,
    classifier: &dyn Classifier,
) -> PredictionResult {
    let body = match client.fetch_capture().await {
        Ok(body) => body,
        Err(Error::NoCaptureYet) => return PredictionResult::pending(WAITING_STATUS),
        Err(Error::Transport(detail)) => {
            return PredictionResult::pending(format!("connection error: {detail}"))
        }
        Err(err) => return PredictionResult::pending(format!("connection error: {err}")),
    };

    let frame = match FrameBuffer::from_nested(&body.image_data) {
        Ok(frame) => frame,
        Err(err) => return PredictionResult::pending(format!("malformed capture: {err}")),
    };

    match classifier.predict(&frame.normalized()) {
        Ok(probability) => {
            PredictionResult::classified(body.temperature, body.humidity, frame, probability)
        }
        Err(err) => PredictionResult::pending(format!("classification failed: {err}")),
    }
}

/// Polls the station, classifies, and replaces the prediction result cell
/// as one unit per iteration. The interval is measured from the completion
/// of one iteration to the start of the next, so slow classification
/// self-throttles.
pub async fn fetch_loop(
    client: CaptureClient,
    classifier: Arc<dyn Classifier>,
    results: SharedCell<PredictionResult>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    loop {
        let outcome = tokio::select! {
            _ = cancel_token.cancelled() => break,
            outcome = perform_fetch(&client, classifier.as_ref()) => outcome,
        };
        log::info!("prediction: {}", outcome.status);
        results.set(outcome).await;

        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    log::info!("fetch loop shutting down");
}

/// Owns the fetch loop task for the lifetime of the monitor process.
pub struct FetchController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl FetchController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(
        &mut self,
        config: &MonitorConfig,
        classifier: Arc<dyn Classifier>,
        results: SharedCell<PredictionResult>,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("fetch loop already active");
        }

        let client = CaptureClient::new(&config.station_url, config.request_timeout())
            .context("failed to build capture client")?;
        let cancel_token = CancellationToken::new();

        self.handle = Some(tokio::spawn(fetch_loop(
            client,
            classifier,
            results,
            config.fetch_interval(),
            cancel_token.clone(),
        )));
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.await.context("fetch loop task failed to join")?;
        }
        Ok(())
    }
}

impl Default for FetchController {
    fn default() -> Self {
        Self::new()
    }
}
