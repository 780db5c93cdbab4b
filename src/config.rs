use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How an ingest loop reacts to consecutive transient read failures.
///
/// `max_consecutive_failures: None` retries forever (the historical
/// behavior); a bound makes the loop log an error and stop once exceeded,
/// leaving its cell in whatever state it last reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub delay_ms: u64,
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 100,
            max_consecutive_failures: None,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn exhausted(&self, consecutive_failures: u32) -> bool {
        self.max_consecutive_failures
            .is_some_and(|limit| consecutive_failures >= limit)
    }
}

/// Station-side (Raspberry Pi) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub bind_addr: String,
    pub serial_device: PathBuf,
    pub camera_spool: PathBuf,
    pub camera_interval_ms: u64,
    pub stream_interval_ms: u64,
    pub sensor_retry: RetryPolicy,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            serial_device: PathBuf::from("/dev/ttyACM0"),
            camera_spool: PathBuf::from("/dev/shm/sporewatch-frame.jpg"),
            camera_interval_ms: 50,
            stream_interval_ms: 50,
            sensor_retry: RetryPolicy::default(),
        }
    }
}

impl StationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        load_or_default(path)
    }

    pub fn camera_interval(&self) -> Duration {
        Duration::from_millis(self.camera_interval_ms)
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_millis(self.stream_interval_ms)
    }
}

/// Monitor-side (desktop) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub station_url: String,
    pub model_path: PathBuf,
    pub fetch_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            station_url: "http://192.168.0.14:8080".to_string(),
            model_path: PathBuf::from("fungus_model.json"),
            fetch_interval_ms: 3000,
            request_timeout_ms: 5000,
        }
    }
}

impl MonitorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        load_or_default(path)
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_millis(self.fetch_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// Missing file means defaults; a file that fails to parse surfaces the error.
fn load_or_default<T>(path: &Path) -> Result<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config at {}", path.display()))
}
