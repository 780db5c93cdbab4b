use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::wire::{CapturedDataResponse, SensorBody, StatusBody};

use super::freeze::{export_capture, freeze};
use super::StationState;

const STREAM_BOUNDARY: &str = "frame";
const STREAM_PIPE_CAPACITY: usize = 64 * 1024;

const INDEX_PAGE: &str = r#"<html>
<head><title>Sporewatch Station</title></head>
<body>
    <h1>Live Fungus Monitoring</h1>
    <img src="/video_feed" width="320" height="240"><br>
    <p>Temperature: <span id="temp">...</span>&deg;C | Humidity: <span id="hum">...</span>%</p>
    <button onclick="capture()">Freeze Capture</button>
    <p id="status">Waiting for capture...</p>
    <script>
        function updateSensor() {
            fetch('/api/sensor').then(r => r.json()).then(data => {
                document.getElementById('temp').innerText = data.temperature ?? 'N/A';
                document.getElementById('hum').innerText = data.humidity ?? 'N/A';
            });
        }
        setInterval(updateSensor, 2000);

        function capture() {
            document.getElementById('status').innerText = 'Freezing...';
            fetch('/capture').then(r => r.json()).then(data => {
                document.getElementById('status').innerText =
                    data.status === 'OK' ? 'Capture frozen.' : 'Capture failed: ' + data.message;
            });
        }
    </script>
</body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// `GET /api/sensor` - the live sensor cell.
pub async fn sensor_api(State(state): State<StationState>) -> Json<SensorBody> {
    let body = match state.cells.live_sensor.get().await {
        Some(reading) => SensorBody::from(&reading),
        None => SensorBody::empty(),
    };
    Json(body)
}

/// `GET /capture` - runs the freeze operation.
pub async fn capture(State(state): State<StationState>) -> Response {
    match freeze(&state.cells).await {
        Ok(capture) => {
            log::info!(
                "capture frozen at {} ({}C, {}%)",
                capture.captured_at,
                capture.temperature,
                capture.humidity
            );
            Json(StatusBody::ok()).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(StatusBody::error(err.to_string())),
        )
            .into_response(),
    }
}

/// `GET /api/captured_data` - the frozen capture in transport form.
pub async fn captured_data(State(state): State<StationState>) -> Response {
    match export_capture(&state.cells.frozen).await {
        Ok(body) => Json(CapturedDataResponse::ok(body)).into_response(),
        Err(err) => (
            StatusCode::NOT_FOUND,
            Json(CapturedDataResponse::error(err.to_string())),
        )
            .into_response(),
    }
}

/// `GET /video_feed` - continuous multipart JPEG stream of the live frame
/// cell, one part per stream tick. The writer task ends when the client
/// disconnects or the station shuts down.
pub async fn video_feed(State(state): State<StationState>) -> Response {
    let (read_half, mut write_half) = tokio::io::duplex(STREAM_PIPE_CAPACITY);
    let frames = state.cells.live_frame.clone();
    let shutdown = state.shutdown.clone();
    let tick = state.stream_interval;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(tick) => {}
            }

            let Some(frame) = frames.get().await else {
                continue;
            };
            let jpeg = match frame.encode_jpeg() {
                Ok(jpeg) => jpeg,
                Err(err) => {
                    log::warn!("stream frame encoding failed: {err:#}");
                    continue;
                }
            };

            let mut part = Vec::with_capacity(jpeg.len() + 64);
            part.extend_from_slice(
                format!("--{STREAM_BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n").as_bytes(),
            );
            part.extend_from_slice(&jpeg);
            part.extend_from_slice(b"\r\n");

            if write_half.write_all(&part).await.is_err() {
                // Client disconnected.
                break;
            }
        }
    });

    (
        [(
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        )],
        Body::from_stream(ReaderStream::new(read_half)),
    )
        .into_response()
}
