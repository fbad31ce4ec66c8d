//! Frame-to-frame motion detection.
//!
//! `FrameDiffer` compares two consecutive frames: grayscale both, take the
//! absolute per-pixel difference, threshold it into a binary mask, dilate the
//! mask so nearby changed pixels merge into one region, then count connected
//! regions. Motion is declared present iff at least one region survives.
//!
//! The differ is a pure function of its two inputs: no retained state, no
//! side effects, deterministic for frames of identical dimensions.

use std::time::Duration;
use thiserror::Error;

use crate::frame::Frame;

/// Dilation passes over the binary mask. Two passes with a 3x3 neighborhood
/// merge regions up to ~4 pixels apart.
const DILATE_PASSES: usize = 2;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MotionError {
    #[error("frame dimension mismatch: {prev_width}x{prev_height} vs {cur_width}x{cur_height}")]
    DimensionMismatch {
        prev_width: u32,
        prev_height: u32,
        cur_width: u32,
        cur_height: u32,
    },
}

/// Per-frame motion signal. Created once per frame, never mutated.
///
/// `diff_magnitude` is the connected changed-region count after dilation.
/// It is diagnostic output only; the fusion logic keys off `motion_detected`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MotionSample {
    pub frame_index: u64,
    pub timestamp: Duration,
    pub motion_detected: bool,
    pub diff_magnitude: u32,
}

impl MotionSample {
    /// A no-motion sample for a frame with no predecessor (the first frame of
    /// a stream, or the frame after a skipped one).
    pub fn still(frame: &Frame) -> Self {
        Self {
            frame_index: frame.index,
            timestamp: frame.timestamp,
            motion_detected: false,
            diff_magnitude: 0,
        }
    }
}

/// Binary motion detector over consecutive frame pairs.
pub struct FrameDiffer {
    threshold: u8,
}

impl FrameDiffer {
    /// `threshold` is the per-pixel luma delta (out of 255) above which a
    /// pixel counts as changed.
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Compare `prev` and `cur`. Frames must have identical dimensions; the
    /// caller is expected to skip the frame on `DimensionMismatch` rather
    /// than abort the stream.
    pub fn diff(&self, prev: &Frame, cur: &Frame) -> Result<MotionSample, MotionError> {
        if prev.width != cur.width || prev.height != cur.height {
            return Err(MotionError::DimensionMismatch {
                prev_width: prev.width,
                prev_height: prev.height,
                cur_width: cur.width,
                cur_height: cur.height,
            });
        }

        let width = cur.width as usize;
        let height = cur.height as usize;
        let prev_luma = prev.to_luma();
        let cur_luma = cur.to_luma();

        let mut mask: Vec<bool> = prev_luma
            .iter()
            .zip(cur_luma.iter())
            .map(|(a, b)| a.abs_diff(*b) > self.threshold)
            .collect();

        for _ in 0..DILATE_PASSES {
            mask = dilate(&mask, width, height);
        }

        let regions = count_regions(&mask, width, height);

        Ok(MotionSample {
            frame_index: cur.index,
            timestamp: cur.timestamp,
            motion_detected: regions > 0,
            diff_magnitude: regions,
        })
    }
}

/// One 3x3 max-filter pass over the binary mask.
fn dilate(mask: &[bool], width: usize, height: usize) -> Vec<bool> {
    let mut out = vec![false; mask.len()];
    for y in 0..height {
        for x in 0..width {
            if !mask[y * width + x] {
                continue;
            }
            for ny in y.saturating_sub(1)..(y + 2).min(height) {
                for nx in x.saturating_sub(1)..(x + 2).min(width) {
                    out[ny * width + nx] = true;
                }
            }
        }
    }
    out
}

/// Count 8-connected regions of set pixels via iterative flood fill.
fn count_regions(mask: &[bool], width: usize, height: usize) -> u32 {
    let mut visited = vec![false; mask.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut regions = 0u32;

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }
        regions += 1;
        visited[start] = true;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            let y = idx / width;
            let x = idx % width;
            for ny in y.saturating_sub(1)..(y + 2).min(height) {
                for nx in x.saturating_sub(1)..(x + 2).min(width) {
                    let n = ny * width + nx;
                    if mask[n] && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 32;
    const H: u32 = 24;

    fn gray_frame(index: u64, fill: u8) -> Frame {
        let pixels = vec![fill; (W * H) as usize * crate::frame::BYTES_PER_PIXEL];
        Frame::new(index, Duration::from_millis(index * 33), W, H, pixels).unwrap()
    }

    fn frame_with_block(index: u64, fill: u8, block_fill: u8, bx: usize, by: usize) -> Frame {
        let mut pixels = vec![fill; (W * H) as usize * crate::frame::BYTES_PER_PIXEL];
        for y in by..(by + 6) {
            for x in bx..(bx + 6) {
                let base = (y * W as usize + x) * crate::frame::BYTES_PER_PIXEL;
                pixels[base..base + 3].fill(block_fill);
            }
        }
        Frame::new(index, Duration::from_millis(index * 33), W, H, pixels).unwrap()
    }

    #[test]
    fn identical_frames_have_no_motion() {
        let differ = FrameDiffer::new(25);
        let sample = differ.diff(&gray_frame(0, 90), &gray_frame(1, 90)).unwrap();
        assert!(!sample.motion_detected);
        assert_eq!(sample.diff_magnitude, 0);
    }

    #[test]
    fn moved_block_is_motion() {
        let differ = FrameDiffer::new(25);
        let prev = frame_with_block(0, 40, 220, 2, 2);
        let cur = frame_with_block(1, 40, 220, 10, 2);
        let sample = differ.diff(&prev, &cur).unwrap();
        assert!(sample.motion_detected);
        assert!(sample.diff_magnitude >= 1);
    }

    #[test]
    fn sub_threshold_change_is_not_motion() {
        let differ = FrameDiffer::new(25);
        let sample = differ.diff(&gray_frame(0, 90), &gray_frame(1, 100)).unwrap();
        assert!(!sample.motion_detected);
    }

    #[test]
    fn nearby_changed_pixels_merge_into_one_region() {
        let differ = FrameDiffer::new(25);
        let prev = gray_frame(0, 40);
        // Two 6x6 blocks three pixels apart: dilation bridges the gap.
        let mut pixels = vec![40u8; (W * H) as usize * crate::frame::BYTES_PER_PIXEL];
        for &bx in &[4usize, 13usize] {
            for y in 4..10 {
                for x in bx..(bx + 6) {
                    let base = (y * W as usize + x) * crate::frame::BYTES_PER_PIXEL;
                    pixels[base..base + 3].fill(220);
                }
            }
        }
        let cur = Frame::new(1, Duration::from_millis(33), W, H, pixels).unwrap();
        let sample = differ.diff(&prev, &cur).unwrap();
        assert!(sample.motion_detected);
        assert_eq!(sample.diff_magnitude, 1);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let differ = FrameDiffer::new(25);
        let prev = gray_frame(0, 90);
        let cur = Frame::new(
            1,
            Duration::from_millis(33),
            16,
            16,
            vec![90u8; 16 * 16 * crate::frame::BYTES_PER_PIXEL],
        )
        .unwrap();
        let err = differ.diff(&prev, &cur).unwrap_err();
        assert!(matches!(err, MotionError::DimensionMismatch { .. }));
    }

    #[test]
    fn diff_is_deterministic() {
        let differ = FrameDiffer::new(25);
        let prev = frame_with_block(0, 40, 220, 2, 2);
        let cur = frame_with_block(1, 40, 220, 9, 3);
        let a = differ.diff(&prev, &cur).unwrap();
        let b = differ.diff(&prev, &cur).unwrap();
        assert_eq!(a, b);
    }
}
