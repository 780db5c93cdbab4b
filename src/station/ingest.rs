use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::StationConfig;

use super::camera::{camera_loop, FrameSource};
use super::sensor::{sensor_loop, LineSource};
use super::StationCells;

/// Owns the ingest loop tasks for the lifetime of the station process.
pub struct IngestController {
    handles: Vec<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl IngestController {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            cancel_token: None,
        }
    }

    /// Spawns the sensor and camera ingest loops. A `None` sensor source
    /// means the device could not be opened; the live sensor cell then
    /// stays permanently empty while the rest of the station runs.
    pub fn start(
        &mut self,
        sensor_source: Option<impl LineSource + 'static>,
        camera_source: impl FrameSource + 'static,
        cells: &StationCells,
        config: &StationConfig,
        parent: &CancellationToken,
    ) -> Result<()> {
        if self.cancel_token.is_some() {
            bail!("ingest already active");
        }

        let token = parent.child_token();

        if let Some(source) = sensor_source {
            self.handles.push(tokio::spawn(sensor_loop(
                source,
                cells.live_sensor.clone(),
                config.sensor_retry.clone(),
                token.clone(),
            )));
        }
        self.handles.push(tokio::spawn(camera_loop(
            camera_source,
            cells.live_frame.clone(),
            config.camera_interval(),
            token.clone(),
        )));

        self.cancel_token = Some(token);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        for handle in self.handles.drain(..) {
            handle.await.context("ingest loop task failed to join")?;
        }
        Ok(())
    }
}

impl Default for IngestController {
    fn default() -> Self {
        Self::new()
    }
}
