//! Rate-limited detector invocation.
//!
//! The person classifier is far more expensive than motion diffing, so it
//! runs only on every Nth frame; motion detection still runs on all of them.
//! Between samples the last result stands.
//!
//! Detector failures (timeout, unavailable) are deliberately fail-open: the
//! call yields no new sample and the stale presence value carries forward.
//! Marking the subject absent on a classifier outage would be the unsafe
//! error direction - it could silently end an active monitoring session.

use std::time::Duration;

use crate::detect::backend::PersonDetector;
use crate::detect::result::PresenceSample;
use crate::frame::Frame;

pub struct SampledClassifier {
    detector: Box<dyn PersonDetector>,
    sample_interval: u64,
    timeout: Duration,
    last_sample: Option<PresenceSample>,
    invocations: u64,
}

impl SampledClassifier {
    /// `sample_interval` is in frames; the detector runs on frames whose
    /// index is a multiple of it (index 0 included).
    pub fn new(detector: Box<dyn PersonDetector>, sample_interval: u64, timeout: Duration) -> Self {
        Self {
            detector,
            sample_interval: sample_interval.max(1),
            timeout,
            last_sample: None,
            invocations: 0,
        }
    }

    /// Run the detector if this frame is on the sampling grid.
    ///
    /// Returns `None` on off-grid frames and on detector failure; in both
    /// cases the caller keeps using the previously returned sample.
    pub fn maybe_classify(&mut self, frame: &Frame) -> Option<PresenceSample> {
        if frame.index % self.sample_interval != 0 {
            return None;
        }
        self.invocations += 1;
        match self.detector.detect(frame, self.timeout) {
            Ok(sample) => {
                self.last_sample = Some(sample.clone());
                Some(sample)
            }
            Err(e) => {
                log::warn!(
                    "detector '{}' failed on frame {}: {}; keeping last presence sample",
                    self.detector.name(),
                    frame.index,
                    e
                );
                None
            }
        }
    }

    /// Most recent successful sample, if any.
    pub fn last_sample(&self) -> Option<&PresenceSample> {
        self.last_sample.as_ref()
    }

    /// How many times the detector has actually been invoked.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }
}
