use chrono::{DateTime, Utc};

use crate::cell::SharedCell;
use crate::error::Error;
use crate::frame::FrameBuffer;
use crate::wire::{epoch_seconds, CaptureBody};

use super::StationCells;

/// A frozen snapshot of the live state: always fully populated, replaced
/// wholesale by each freeze.
#[derive(Debug, Clone)]
pub struct FrozenCapture {
    pub frame: FrameBuffer,
    pub temperature: f64,
    pub humidity: f64,
    pub captured_at: DateTime<Utc>,
}

impl FrozenCapture {
    pub fn to_body(&self) -> CaptureBody {
        CaptureBody {
            image_data: self.frame.to_nested(),
            temperature: self.temperature,
            humidity: self.humidity,
            timestamp: epoch_seconds(self.captured_at),
        }
    }
}

/// Atomically copies the current live frame and sensor reading, plus a
/// fresh timestamp, into the frozen capture cell.
///
/// Lock acquisition order is fixed: frame, then sensor, then frozen. Any
/// future multi-cell operation must acquire in the same order. The guards
/// drop in reverse declaration order, releasing frozen first and frame
/// last. On `CaptureUnavailable` the frozen cell is left untouched.
pub async fn freeze(cells: &StationCells) -> Result<FrozenCapture, Error> {
    let frame_slot = cells.live_frame.lock().await;
    let sensor_slot = cells.live_sensor.lock().await;
    let mut frozen_slot = cells.frozen.lock().await;

    let (frame, reading) = match (frame_slot.as_ref(), sensor_slot.as_ref()) {
        (Some(frame), Some(reading)) => (frame.clone(), reading.clone()),
        _ => return Err(Error::CaptureUnavailable),
    };

    let capture = FrozenCapture {
        frame,
        temperature: reading.temperature,
        humidity: reading.humidity,
        captured_at: Utc::now(),
    };
    *frozen_slot = Some(capture.clone());
    Ok(capture)
}

/// Serializes the frozen capture to its transport form.
///
/// Copies under the lock and serializes after release, so the frame's
/// nested-list expansion never extends the critical section.
pub async fn export_capture(
    frozen: &SharedCell<Option<FrozenCapture>>,
) -> Result<CaptureBody, Error> {
    let capture = frozen.get().await.ok_or(Error::NoCaptureYet)?;
    Ok(capture.to_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::sensor::SensorReading;

    fn reading(temperature: f64, humidity: f64) -> SensorReading {
        SensorReading {
            temperature,
            humidity,
            observed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn freeze_fails_when_frame_is_missing() {
        let cells = StationCells::new();
        cells.live_sensor.set(Some(reading(22.5, 60.0))).await;

        assert!(matches!(
            freeze(&cells).await,
            Err(Error::CaptureUnavailable)
        ));
        // The frozen cell stays empty: the exporter still has nothing.
        assert!(matches!(
            export_capture(&cells.frozen).await,
            Err(Error::NoCaptureYet)
        ));
    }

    #[tokio::test]
    async fn freeze_fails_when_sensor_is_missing() {
        let cells = StationCells::new();
        cells.live_frame.set(Some(FrameBuffer::zeroed())).await;

        assert!(matches!(
            freeze(&cells).await,
            Err(Error::CaptureUnavailable)
        ));
    }

    #[tokio::test]
    async fn failed_freeze_leaves_prior_capture_in_place() {
        let cells = StationCells::new();
        cells.live_frame.set(Some(FrameBuffer::zeroed())).await;
        cells.live_sensor.set(Some(reading(22.5, 60.0))).await;
        freeze(&cells).await.unwrap();

        // Live inputs go away; a second freeze fails but must not clobber.
        cells.live_frame.set(None).await;
        assert!(freeze(&cells).await.is_err());

        let body = export_capture(&cells.frozen).await.unwrap();
        assert_eq!(body.temperature, 22.5);
    }

    #[tokio::test]
    async fn freeze_exports_snapshot_values() {
        let cells = StationCells::new();
        cells.live_frame.set(Some(FrameBuffer::zeroed())).await;
        cells.live_sensor.set(Some(reading(22.5, 60.0))).await;

        freeze(&cells).await.unwrap();
        let body = export_capture(&cells.frozen).await.unwrap();

        assert_eq!(body.temperature, 22.5);
        assert_eq!(body.humidity, 60.0);
        assert!(body.timestamp > 0.0);
        assert_eq!(body.image_data.len(), 128);
        assert!(body
            .image_data
            .iter()
            .flatten()
            .flatten()
            .all(|&b| b == 0));
    }

    #[tokio::test]
    async fn freeze_copies_by_value_not_by_reference() {
        let cells = StationCells::new();
        cells.live_frame.set(Some(FrameBuffer::zeroed())).await;
        cells.live_sensor.set(Some(reading(22.5, 60.0))).await;
        freeze(&cells).await.unwrap();

        // The camera keeps overwriting the live cell; the frozen snapshot
        // must not follow it.
        cells
            .live_frame
            .set(Some(
                FrameBuffer::from_raw(vec![255; crate::frame::FRAME_LEN]).unwrap(),
            ))
            .await;
        cells.live_sensor.set(Some(reading(30.0, 10.0))).await;

        let body = export_capture(&cells.frozen).await.unwrap();
        assert_eq!(body.temperature, 22.5);
        assert_eq!(body.image_data[0][0], vec![0, 0, 0]);
    }

    #[tokio::test]
    async fn refreeze_replaces_the_previous_capture() {
        let cells = StationCells::new();
        cells.live_frame.set(Some(FrameBuffer::zeroed())).await;
        cells.live_sensor.set(Some(reading(22.5, 60.0))).await;
        let first = freeze(&cells).await.unwrap();

        cells.live_sensor.set(Some(reading(25.0, 40.0))).await;
        let second = freeze(&cells).await.unwrap();

        assert!(second.captured_at >= first.captured_at);
        let body = export_capture(&cells.frozen).await.unwrap();
        assert_eq!(body.temperature, 25.0);
        assert_eq!(body.humidity, 40.0);
    }
}
