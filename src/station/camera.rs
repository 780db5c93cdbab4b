use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cell::SharedCell;
use crate::frame::FrameBuffer;

/// One decoded RGB image as produced by a camera driver.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Source of decoded camera frames. The physical camera driver sits
/// behind this seam.
#[async_trait]
pub trait FrameSource: Send {
    /// Latest frame, `None` when the camera has nothing this tick.
    async fn grab(&mut self) -> Result<Option<RawFrame>>;
}

/// Re-reads a JPEG spool file an external grabber keeps overwriting.
pub struct StillCameraSource {
    path: PathBuf,
}

impl StillCameraSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl FrameSource for StillCameraSource {
    async fn grab(&mut self) -> Result<Option<RawFrame>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            // No frame spooled yet.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let img = image::load_from_memory(&bytes)
            .with_context(|| format!("failed to decode {}", self.path.display()))?
            .to_rgb8();
        Ok(Some(RawFrame {
            width: img.width(),
            height: img.height(),
            rgb: img.into_raw(),
        }))
    }
}

/// Continuously pulls frames, resizes them to 128x128, and replaces the
/// live frame cell wholesale. Read misses and decode errors are swallowed
/// and retried on the next tick.
pub async fn camera_loop(
    mut source: impl FrameSource,
    cell: SharedCell<Option<FrameBuffer>>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match source.grab().await {
                    Ok(Some(raw)) => match FrameBuffer::from_rgb(raw.width, raw.height, raw.rgb) {
                        Ok(frame) => cell.set(Some(frame)).await,
                        Err(err) => log::warn!("camera frame rejected: {err}"),
                    },
                    Ok(None) => {}
                    Err(err) => log::debug!("camera read failed: {err:#}"),
                }
            }
            _ = cancel_token.cancelled() => {
                log::info!("camera loop shutting down");
                break;
            }
        }
    }
}
