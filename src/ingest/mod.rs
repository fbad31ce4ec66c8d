//! Frame sources.
//!
//! A source produces a lazy, ordered, in-principle-infinite sequence of
//! frames. End-of-stream is a defined terminal condition (`Ok(None)`), not
//! an error: the monitor loop stops cleanly when the source runs dry.
//!
//! The synthetic stub source ships in-tree for tests, demos, and `stub://`
//! camera URLs. Real capture backends plug in behind the same trait.

mod synthetic;

use anyhow::Result;
use std::time::Duration;

use crate::frame::Frame;

pub use synthetic::{SyntheticConfig, SyntheticSource};

pub trait FrameSource {
    /// Next frame in stream order, or `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Stream offset of frame `index` at `fps` frames per second.
///
/// Integer-nanosecond arithmetic so equal spans compare exactly (e.g. frame
/// 390 minus frame 90 at 30 fps is precisely 10s).
pub fn frame_timestamp(index: u64, fps: u32) -> Duration {
    Duration::from_nanos(index.saturating_mul(1_000_000_000) / fps.max(1) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_subtract_exactly() {
        let span = frame_timestamp(390, 30) - frame_timestamp(90, 30);
        assert_eq!(span, Duration::from_secs(10));
    }
}
