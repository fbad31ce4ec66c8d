use std::collections::VecDeque;
use std::time::Duration;

use crate::detect::backend::{DetectorError, PersonDetector};
use crate::detect::result::PresenceSample;
use crate::frame::Frame;

/// One scripted outcome: `Ok(present)` or a detector error.
pub type ScriptedStep = Result<bool, DetectorError>;

/// Detector that replays a scripted sequence of outcomes.
///
/// Used to exercise the pipeline's fail-open behavior without a real
/// classifier: after the scripted steps run out, the final step repeats for
/// every further invocation.
pub struct ScriptedDetector {
    steps: VecDeque<ScriptedStep>,
    repeat: Option<ScriptedStep>,
    calls: u64,
}

impl ScriptedDetector {
    pub fn sequence(steps: Vec<ScriptedStep>) -> Self {
        Self {
            steps: steps.into(),
            repeat: None,
            calls: 0,
        }
    }

    /// Report the same outcome on every invocation.
    pub fn always(present: bool) -> Self {
        Self::sequence(vec![Ok(present)])
    }

    /// Fail with the given error on every invocation.
    pub fn always_failing(error: DetectorError) -> Self {
        Self::sequence(vec![Err(error)])
    }

    /// Total invocations so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl PersonDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(
        &mut self,
        frame: &Frame,
        _timeout: Duration,
    ) -> Result<PresenceSample, DetectorError> {
        self.calls += 1;
        let step = match self.steps.pop_front() {
            Some(step) => {
                self.repeat = Some(step.clone());
                step
            }
            None => self
                .repeat
                .clone()
                .unwrap_or_else(|| Err(DetectorError::Unavailable("empty script".to_string()))),
        };
        let present = step?;
        Ok(PresenceSample {
            frame_index: frame.index,
            timestamp: frame.timestamp,
            human_present: present,
            detection_count: present as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64) -> Frame {
        Frame::new(index, Duration::from_secs(index), 4, 4, vec![0u8; 4 * 4 * 3]).unwrap()
    }

    #[test]
    fn final_step_repeats() {
        let mut detector = ScriptedDetector::sequence(vec![
            Ok(true),
            Err(DetectorError::Timeout(Duration::from_millis(500))),
        ]);
        assert!(detector
            .detect(&frame(0), Duration::from_millis(500))
            .unwrap()
            .human_present);
        for index in 1..5 {
            let result = detector.detect(&frame(index), Duration::from_millis(500));
            assert!(matches!(result, Err(DetectorError::Timeout(_))));
        }
        assert_eq!(detector.calls(), 5);
    }
}
