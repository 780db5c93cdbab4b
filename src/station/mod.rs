pub mod camera;
pub mod freeze;
pub mod ingest;
pub mod routes;
pub mod sensor;
pub mod server;

pub use self::freeze::{export_capture, freeze, FrozenCapture};
pub use self::ingest::IngestController;
pub use self::server::{serve, StationState};

use crate::cell::SharedCell;
use crate::frame::FrameBuffer;

use self::sensor::SensorReading;

/// The station's shared state: one cell per concern, created at process
/// start and passed to the components that need them.
#[derive(Clone)]
pub struct StationCells {
    /// Continuously overwritten by the sensor ingest loop.
    pub live_sensor: SharedCell<Option<SensorReading>>,
    /// Continuously overwritten by the camera ingest loop.
    pub live_frame: SharedCell<Option<FrameBuffer>>,
    /// Written only by the freeze operation; read by the exporter.
    pub frozen: SharedCell<Option<FrozenCapture>>,
}

impl StationCells {
    pub fn new() -> Self {
        Self {
            live_sensor: SharedCell::new(None),
            live_frame: SharedCell::new(None),
            frozen: SharedCell::new(None),
        }
    }
}

impl Default for StationCells {
    fn default() -> Self {
        Self::new()
    }
}
