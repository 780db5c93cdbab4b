use thiserror::Error;

/// Failure taxonomy shared by the station and the monitor.
///
/// Every variant is recovered at the boundary where it occurs and turned
/// into an HTTP error body or a user-visible status string. The one
/// exception is `ModelUnavailable` at monitor startup, which is fatal to
/// the classifying process.
#[derive(Debug, Error)]
pub enum Error {
    /// Freeze preconditions unmet: the live frame cell is empty or no
    /// sensor reading has arrived yet.
    #[error("camera or sensor data unavailable")]
    CaptureUnavailable,

    /// The frozen capture cell has never been written since process start.
    #[error("no capture has been frozen yet")]
    NoCaptureYet,

    /// Network-level failure: timeout, connection refused, unexpected
    /// status, malformed response body.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The classifier artifact failed to load, or its shape does not match
    /// the input it is asked to score.
    #[error("classifier unavailable: {0}")]
    ModelUnavailable(String),

    /// A serialized frame did not reconstruct into a 128x128x3 buffer.
    #[error("malformed frame: {0}")]
    Decode(String),
}
