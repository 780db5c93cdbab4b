use std::fmt;
use std::io::Cursor;

use anyhow::{anyhow, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, RgbImage};

use crate::error::Error;

pub const FRAME_WIDTH: u32 = 128;
pub const FRAME_HEIGHT: u32 = 128;
pub const FRAME_CHANNELS: usize = 3;
pub const FRAME_LEN: usize = (FRAME_WIDTH as usize) * (FRAME_HEIGHT as usize) * FRAME_CHANNELS;

const JPEG_QUALITY: u8 = 80;

/// One fixed-size 128x128x3 image of byte intensities.
///
/// Each write into a cell is an independent copy; a frozen buffer never
/// aliases the live one the camera loop keeps overwriting.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Wraps a raw row-major RGB byte buffer that is already frame-sized.
    pub fn from_raw(data: Vec<u8>) -> Result<Self, Error> {
        if data.len() != FRAME_LEN {
            return Err(Error::Decode(format!(
                "expected {FRAME_LEN} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { data })
    }

    pub fn zeroed() -> Self {
        Self {
            data: vec![0; FRAME_LEN],
        }
    }

    /// Builds a frame from an arbitrarily sized RGB image, resizing to
    /// 128x128 when needed.
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, Error> {
        if width == FRAME_WIDTH && height == FRAME_HEIGHT {
            return Self::from_raw(rgb);
        }
        let img = RgbImage::from_raw(width, height, rgb).ok_or_else(|| {
            Error::Decode(format!("byte length does not match {width}x{height} RGB"))
        })?;
        let resized = image::imageops::resize(&img, FRAME_WIDTH, FRAME_HEIGHT, FilterType::Triangle);
        Ok(Self {
            data: resized.into_raw(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Transport form: a height x width x 3 nested list of integers.
    pub fn to_nested(&self) -> Vec<Vec<Vec<u8>>> {
        self.data
            .chunks(FRAME_WIDTH as usize * FRAME_CHANNELS)
            .map(|row| row.chunks(FRAME_CHANNELS).map(|px| px.to_vec()).collect())
            .collect()
    }

    /// Reconstructs a frame from its transport form, validating every
    /// dimension.
    pub fn from_nested(rows: &[Vec<Vec<u8>>]) -> Result<Self, Error> {
        if rows.len() != FRAME_HEIGHT as usize {
            return Err(Error::Decode(format!(
                "expected {FRAME_HEIGHT} rows, got {}",
                rows.len()
            )));
        }
        let mut data = Vec::with_capacity(FRAME_LEN);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != FRAME_WIDTH as usize {
                return Err(Error::Decode(format!(
                    "row {y}: expected {FRAME_WIDTH} pixels, got {}",
                    row.len()
                )));
            }
            for (x, px) in row.iter().enumerate() {
                if px.len() != FRAME_CHANNELS {
                    return Err(Error::Decode(format!(
                        "pixel ({x},{y}): expected {FRAME_CHANNELS} channels, got {}",
                        px.len()
                    )));
                }
                data.extend_from_slice(px);
            }
        }
        Ok(Self { data })
    }

    /// 0-1 scaled intensities in classifier input order.
    pub fn normalized(&self) -> Vec<f32> {
        self.data.iter().map(|&b| f32::from(b) / 255.0).collect()
    }

    /// Encodes the frame as JPEG for the live stream.
    pub fn encode_jpeg(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
            .encode(
                &self.data,
                FRAME_WIDTH,
                FRAME_HEIGHT,
                ExtendedColorType::Rgb8,
            )
            .map_err(|err| anyhow!("jpeg encoding failed: {err}"))?;
        Ok(out.into_inner())
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &FRAME_WIDTH)
            .field("height", &FRAME_HEIGHT)
            .finish()
    }
}
