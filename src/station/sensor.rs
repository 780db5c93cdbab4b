use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio_util::sync::CancellationToken;

use crate::cell::SharedCell;
use crate::config::RetryPolicy;

/// The most recent temperature/humidity pair. Both fields are always
/// replaced together; a reading is never partially updated.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
    pub observed_at: DateTime<Utc>,
}

/// Source of raw firmware text lines. The physical serial driver sits
/// behind this seam.
#[async_trait]
pub trait LineSource: Send {
    /// Next line from the device, `None` once the stream ends.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

/// Reads the firmware's text stream straight off a tty device file.
pub struct SerialLineSource {
    lines: Lines<BufReader<File>>,
}

impl SerialLineSource {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("failed to open serial device {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
        })
    }
}

#[async_trait]
impl LineSource for SerialLineSource {
    async fn next_line(&mut self) -> Result<Option<String>> {
        self.lines.next_line().await.context("serial read failed")
    }
}

/// Parses a firmware line of the form `Temp:23.50,Hum:60.00`.
pub fn parse_sensor_line(line: &str) -> Option<(f64, f64)> {
    let (temp_part, hum_part) = line.split_once(',')?;
    let temperature = temp_part.trim().strip_prefix("Temp:")?.trim().parse().ok()?;
    let humidity = hum_part.trim().strip_prefix("Hum:")?.trim().parse().ok()?;
    Some((temperature, humidity))
}

fn looks_like_reading(line: &str) -> bool {
    line.contains("Temp:") && line.contains("Hum:")
}

/// Continuously parses the firmware stream and overwrites the live sensor
/// cell. Malformed readings and read errors are transient and retried per
/// `retry`; end-of-stream is permanent and leaves the cell as-is.
pub async fn sensor_loop(
    mut source: impl LineSource,
    cell: SharedCell<Option<SensorReading>>,
    retry: RetryPolicy,
    cancel_token: CancellationToken,
) {
    let mut consecutive_failures: u32 = 0;

    loop {
        let line = tokio::select! {
            _ = cancel_token.cancelled() => {
                log::info!("sensor loop shutting down");
                return;
            }
            line = source.next_line() => line,
        };

        match line {
            Ok(Some(line)) => {
                if let Some((temperature, humidity)) = parse_sensor_line(&line) {
                    consecutive_failures = 0;
                    cell.set(Some(SensorReading {
                        temperature,
                        humidity,
                        observed_at: Utc::now(),
                    }))
                    .await;
                } else if looks_like_reading(&line) {
                    // A reading-shaped line that failed to parse.
                    consecutive_failures += 1;
                    log::debug!("malformed sensor line {line:?}");
                    if give_up_or_delay(&retry, consecutive_failures, &cancel_token).await {
                        return;
                    }
                }
                // Unrelated firmware chatter is skipped silently.
            }
            Ok(None) => {
                log::error!("sensor stream ended; live readings will no longer update");
                return;
            }
            Err(err) => {
                consecutive_failures += 1;
                log::debug!("sensor read failed ({consecutive_failures}): {err:#}");
                if give_up_or_delay(&retry, consecutive_failures, &cancel_token).await {
                    return;
                }
            }
        }
    }
}

// Returns true when the loop should stop, either because the retry bound
// tripped or cancellation fired during the retry delay.
async fn give_up_or_delay(
    retry: &RetryPolicy,
    consecutive_failures: u32,
    cancel_token: &CancellationToken,
) -> bool {
    if retry.exhausted(consecutive_failures) {
        log::error!(
            "sensor ingest giving up after {consecutive_failures} consecutive failures"
        );
        return true;
    }
    tokio::select! {
        _ = cancel_token.cancelled() => true,
        _ = tokio::time::sleep(retry.delay()) => false,
    }
}
