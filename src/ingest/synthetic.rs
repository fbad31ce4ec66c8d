//! Synthetic frame source.
//!
//! Renders a deterministic scene: a dim checkerboard background with an
//! optional bright "swimmer" block that drifts sideways until a scripted
//! frame, then freezes. Every frame is a pure function of its index, so runs
//! are reproducible and consecutive frames differ exactly where the block
//! moved.

use anyhow::Result;
use std::time::Duration;

use super::{frame_timestamp, FrameSource};
use crate::frame::{Frame, BYTES_PER_PIXEL};

const SUBJECT_SIZE: usize = 48;
const SUBJECT_LUMA: u8 = 220;
const DRIFT_PX_PER_FRAME: u64 = 4;

#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Number of frames to produce; `None` runs until stopped.
    pub total_frames: Option<u64>,
    /// Render the swimmer block at all.
    pub subject_visible: bool,
    /// Frame index after which the subject stops moving; `None` keeps it
    /// drifting forever.
    pub still_after: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
            total_frames: None,
            subject_visible: true,
            still_after: None,
        }
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    next_index: u64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            next_index: 0,
        }
    }

    fn render(&self, index: u64) -> Vec<u8> {
        let width = self.config.width as usize;
        let height = self.config.height as usize;
        let mut pixels = vec![0u8; width * height * BYTES_PER_PIXEL];

        for y in 0..height {
            for x in 0..width {
                let shade = if (x / 8 + y / 8) % 2 == 0 { 16 } else { 40 };
                let base = (y * width + x) * BYTES_PER_PIXEL;
                pixels[base..base + BYTES_PER_PIXEL].fill(shade);
            }
        }

        if self.config.subject_visible && width > SUBJECT_SIZE && height > SUBJECT_SIZE {
            let steps = match self.config.still_after {
                Some(still_after) => index.min(still_after),
                None => index,
            };
            let bx = (steps * DRIFT_PX_PER_FRAME) as usize % (width - SUBJECT_SIZE);
            let by = (height - SUBJECT_SIZE) / 2;
            for y in by..(by + SUBJECT_SIZE) {
                for x in bx..(bx + SUBJECT_SIZE) {
                    let base = (y * width + x) * BYTES_PER_PIXEL;
                    pixels[base..base + BYTES_PER_PIXEL].fill(SUBJECT_LUMA);
                }
            }
        }

        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(total) = self.config.total_frames {
            if self.next_index >= total {
                return Ok(None);
            }
        }
        let index = self.next_index;
        self.next_index += 1;

        let timestamp = frame_timestamp(index, self.config.fps);
        let pixels = self.render(index);
        let frame = Frame::new(
            index,
            timestamp,
            self.config.width,
            self.config.height,
            pixels,
        )?;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::FrameDiffer;

    fn config(total: u64, still_after: Option<u64>) -> SyntheticConfig {
        SyntheticConfig {
            width: 160,
            height: 120,
            fps: 30,
            total_frames: Some(total),
            subject_visible: true,
            still_after,
        }
    }

    #[test]
    fn ends_after_total_frames() {
        let mut source = SyntheticSource::new(config(3, None));
        for expected in 0..3 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.index, expected);
        }
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn subject_freezes_after_scripted_frame() {
        let mut source = SyntheticSource::new(config(20, Some(5)));
        let differ = FrameDiffer::new(25);
        let mut prev = source.next_frame().unwrap().unwrap();
        let mut last_motion_index = 0u64;
        while let Some(frame) = source.next_frame().unwrap() {
            let sample = differ.diff(&prev, &frame).unwrap();
            if sample.motion_detected {
                last_motion_index = frame.index;
            }
            prev = frame;
        }
        assert_eq!(last_motion_index, 5);
    }

    #[test]
    fn moving_subject_produces_motion_every_frame() {
        let mut source = SyntheticSource::new(config(10, None));
        let differ = FrameDiffer::new(25);
        let mut prev = source.next_frame().unwrap().unwrap();
        while let Some(frame) = source.next_frame().unwrap() {
            let sample = differ.diff(&prev, &frame).unwrap();
            assert!(sample.motion_detected, "frame {}", frame.index);
            prev = frame;
        }
    }
}
