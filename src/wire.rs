use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::station::sensor::SensorReading;

pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "ERROR";

/// Converts an internal timestamp to the wire's numeric epoch seconds.
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

/// Body of `GET /api/sensor`, reflecting the live sensor cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorBody {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub timestamp: Option<f64>,
}

impl SensorBody {
    pub fn empty() -> Self {
        Self {
            temperature: None,
            humidity: None,
            timestamp: None,
        }
    }
}

impl From<&SensorReading> for SensorBody {
    fn from(reading: &SensorReading) -> Self {
        Self {
            temperature: Some(reading.temperature),
            humidity: Some(reading.humidity),
            timestamp: Some(epoch_seconds(reading.observed_at)),
        }
    }
}

/// The frozen capture in transport form: the frame as a nested list of
/// integers, sensor values, and the freeze time in epoch seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureBody {
    #[serde(default)]
    pub image_data: Vec<Vec<Vec<u8>>>,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: f64,
}

/// Envelope of `GET /api/captured_data`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CapturedDataResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CaptureBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CapturedDataResponse {
    pub fn ok(data: CaptureBody) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Envelope of `GET /capture` and other status-only responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusBody {
    pub fn ok() -> Self {
        Self {
            status: STATUS_OK.to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_body_serializes_absent_fields_as_null() {
        let json = serde_json::to_value(SensorBody::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"temperature": null, "humidity": null, "timestamp": null})
        );
    }

    #[test]
    fn status_body_omits_message_on_ok() {
        let json = serde_json::to_value(StatusBody::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"status": "OK"}));

        let json = serde_json::to_value(StatusBody::error("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "ERROR", "message": "boom"}));
    }

    #[test]
    fn captured_data_response_tolerates_missing_image_data() {
        let parsed: CapturedDataResponse = serde_json::from_value(serde_json::json!({
            "status": "OK",
            "data": {"temperature": 21.0, "humidity": 55.0, "timestamp": 1.0}
        }))
        .unwrap();
        assert!(parsed.data.unwrap().image_data.is_empty());
    }

    #[test]
    fn epoch_seconds_preserves_subsecond_precision() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_250).unwrap();
        assert!((epoch_seconds(at) - 1_700_000_000.25).abs() < 1e-6);
    }
}
