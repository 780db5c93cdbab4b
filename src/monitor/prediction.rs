use crate::frame::FrameBuffer;

/// Healthy-class probability at or above this reads as healthy.
pub const HEALTHY_THRESHOLD: f32 = 0.5;

/// The latest fetch-and-classify outcome, replaced as one unit every
/// iteration. A reader never sees a new probability paired with a stale
/// frame.
#[derive(Debug, Clone)]
pub struct PredictionResult {
    pub status: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub frame: Option<FrameBuffer>,
    pub probability: Option<f32>,
}

impl PredictionResult {
    /// A result with no data yet: waiting, connecting, or failed.
    pub fn pending(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            temperature: None,
            humidity: None,
            frame: None,
            probability: None,
        }
    }

    pub fn classified(
        temperature: f64,
        humidity: f64,
        frame: FrameBuffer,
        probability: f32,
    ) -> Self {
        Self {
            status: verdict_status(probability),
            temperature: Some(temperature),
            humidity: Some(humidity),
            frame: Some(frame),
            probability: Some(probability),
        }
    }
}

/// Decision rule over the healthy-class probability.
pub fn verdict_status(probability: f32) -> String {
    let percent = probability * 100.0;
    if probability >= HEALTHY_THRESHOLD {
        format!("healthy ({percent:.2}%)")
    } else {
        format!("fungus detected (healthy-probability {percent:.2}%)")
    }
}
