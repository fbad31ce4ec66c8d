//! Video frames as owned pixel buffers.
//!
//! A `Frame` is one timestamped image sample from the stream. Frames are
//! immutable once produced and move by value through the pipeline: the stage
//! currently processing a frame owns it exclusively and hands it off to the
//! next stage.

use anyhow::{anyhow, Result};
use std::time::Duration;

/// Fixed channel depth: packed RGB, three bytes per pixel.
pub const BYTES_PER_PIXEL: usize = 3;

/// One timestamped frame from the video stream.
///
/// `timestamp` is the offset from the start of the stream, assigned by the
/// frame source. The pixel buffer is validated at construction and read-only
/// afterwards.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Position in the stream, starting at 0.
    pub index: u64,
    /// Offset from the start of the stream.
    pub timestamp: Duration,
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Build a frame, validating that the pixel buffer matches the declared
    /// dimensions. A mismatched buffer is malformed input and fails here so
    /// that no later stage has to re-check it.
    pub fn new(
        index: u64,
        timestamp: Duration,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(anyhow!(
                "frame {} pixel buffer is {} bytes, expected {} for {}x{}",
                index,
                pixels.len(),
                expected,
                width,
                height
            ));
        }
        Ok(Self {
            index,
            timestamp,
            width,
            height,
            pixels,
        })
    }

    /// Raw packed RGB bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Single-intensity representation of the frame (integer BT.601 luma),
    /// one byte per pixel.
    pub fn to_luma(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|px| {
                let r = px[0] as u32;
                let g = px[1] as u32;
                let b = px[2] as u32;
                ((299 * r + 587 * g + 114 * b) / 1000) as u8
            })
            .collect()
    }
}
