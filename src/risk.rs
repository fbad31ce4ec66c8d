//! Fusion of motion and presence signals into a risk level.
//!
//! The state machine is evaluated once per frame, whether or not a fresh
//! presence sample arrived on that frame (stale presence carries forward).
//! The level is a pure function of {presence, motion-this-frame, elapsed
//! time since last motion}; the only memory across frames is the last-motion
//! timestamp and the last known presence.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::detect::PresenceSample;
use crate::motion::MotionSample;

/// Fused classification of subject status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// No subject in frame: no presence sample yet, or the most recent
    /// sample says absent. Motion is ignored for alerting purposes.
    #[default]
    NoSubject,
    /// Subject present and moving this frame.
    Active,
    /// Subject present, not moving, below the alert threshold.
    Monitoring,
    /// Subject present and motionless for at least the alert threshold.
    Alert,
}

/// The single mutable record behind the state machine.
///
/// Owned exclusively by one `RiskStateMachine`, which is owned by one monitor
/// loop; created at monitor start, updated on every frame, dropped when the
/// monitor stops. Independent camera feeds get independent instances.
#[derive(Clone, Debug)]
pub struct RiskState {
    /// Stream offset of the most recent motion (or the first frame observed,
    /// as a baseline before any motion has been seen).
    pub last_motion: Option<Duration>,
    /// Last known presence. `None` until the first sample ever arrives.
    pub human_present: Option<bool>,
    /// Stream offset of the most recent frame processed.
    pub last_observed: Duration,
    pub current_level: RiskLevel,
}

impl RiskState {
    fn new() -> Self {
        Self {
            last_motion: None,
            human_present: None,
            last_observed: Duration::ZERO,
            current_level: RiskLevel::NoSubject,
        }
    }

    /// Time without motion as of the most recent frame.
    pub fn stalled_for(&self) -> Duration {
        self.last_observed
            .saturating_sub(self.last_motion.unwrap_or(self.last_observed))
    }
}

pub struct RiskStateMachine {
    alert_after: Duration,
    state: RiskState,
}

impl RiskStateMachine {
    /// `alert_after` is the motionless time after which a present subject is
    /// escalated to `Alert`. A configuration input, not a constant.
    pub fn new(alert_after: Duration) -> Self {
        Self {
            alert_after,
            state: RiskState::new(),
        }
    }

    /// Evaluate one frame.
    ///
    /// `presence` is `Some` only on frames where the sampled classifier
    /// produced a fresh sample; it supersedes the stored presence. On all
    /// other frames the last known presence applies.
    pub fn update(
        &mut self,
        motion: &MotionSample,
        presence: Option<&PresenceSample>,
    ) -> RiskLevel {
        if let Some(sample) = presence {
            self.state.human_present = Some(sample.human_present);
        }

        self.state.last_observed = motion.timestamp;

        // The first frame seeds the baseline; afterwards only real motion
        // advances it. Motion advances the baseline even with no subject in
        // frame, so a subject appearing right after churn is not instantly
        // flagged as stalled.
        if motion.motion_detected || self.state.last_motion.is_none() {
            self.state.last_motion = Some(motion.timestamp);
        }

        let level = match self.state.human_present {
            None | Some(false) => RiskLevel::NoSubject,
            Some(true) if motion.motion_detected => RiskLevel::Active,
            Some(true) => {
                if self.state.stalled_for() >= self.alert_after {
                    RiskLevel::Alert
                } else {
                    RiskLevel::Monitoring
                }
            }
        };
        self.state.current_level = level;
        level
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    pub fn current_level(&self) -> RiskLevel {
        self.state.current_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALERT_AFTER: Duration = Duration::from_secs(10);

    fn motion_at(secs_tenths: u64, moving: bool) -> MotionSample {
        MotionSample {
            frame_index: secs_tenths,
            timestamp: Duration::from_millis(secs_tenths * 100),
            motion_detected: moving,
            diff_magnitude: moving as u32,
        }
    }

    fn presence_at(secs_tenths: u64, present: bool) -> PresenceSample {
        PresenceSample {
            frame_index: secs_tenths,
            timestamp: Duration::from_millis(secs_tenths * 100),
            human_present: present,
            detection_count: present as u32,
        }
    }

    #[test]
    fn unknown_presence_is_no_subject() {
        let mut machine = RiskStateMachine::new(ALERT_AFTER);
        assert_eq!(machine.update(&motion_at(0, true), None), RiskLevel::NoSubject);
        assert_eq!(machine.update(&motion_at(1, false), None), RiskLevel::NoSubject);
    }

    #[test]
    fn absent_subject_ignores_motion() {
        let mut machine = RiskStateMachine::new(ALERT_AFTER);
        let absent = presence_at(0, false);
        assert_eq!(
            machine.update(&motion_at(0, true), Some(&absent)),
            RiskLevel::NoSubject
        );
    }

    #[test]
    fn present_and_moving_is_active() {
        let mut machine = RiskStateMachine::new(ALERT_AFTER);
        let present = presence_at(0, true);
        assert_eq!(
            machine.update(&motion_at(0, true), Some(&present)),
            RiskLevel::Active
        );
    }

    #[test]
    fn stale_presence_carries_forward() {
        let mut machine = RiskStateMachine::new(ALERT_AFTER);
        let present = presence_at(0, true);
        machine.update(&motion_at(0, true), Some(&present));
        // No fresh sample for the following frames.
        assert_eq!(machine.update(&motion_at(1, true), None), RiskLevel::Active);
        assert_eq!(
            machine.update(&motion_at(2, false), None),
            RiskLevel::Monitoring
        );
    }

    #[test]
    fn alert_fires_at_threshold_not_before() {
        let mut machine = RiskStateMachine::new(ALERT_AFTER);
        let present = presence_at(0, true);
        machine.update(&motion_at(0, true), Some(&present));

        // Motionless from t=0.0s on; threshold is 10s, so t=9.9s is still
        // Monitoring and t=10.0s is the first Alert frame.
        for tenth in 1..100 {
            assert_eq!(
                machine.update(&motion_at(tenth, false), None),
                RiskLevel::Monitoring,
                "tenth {}",
                tenth
            );
        }
        assert_eq!(machine.update(&motion_at(100, false), None), RiskLevel::Alert);
        assert_eq!(machine.state().stalled_for(), Duration::from_secs(10));
    }

    #[test]
    fn motion_resets_the_clock() {
        let mut machine = RiskStateMachine::new(ALERT_AFTER);
        let present = presence_at(0, true);
        machine.update(&motion_at(0, true), Some(&present));
        for tenth in 1..95 {
            machine.update(&motion_at(tenth, false), None);
        }
        assert_eq!(machine.update(&motion_at(95, true), None), RiskLevel::Active);
        // 9.5s of stillness was wiped by that motion; another 9.9s is needed.
        for tenth in 96..194 {
            assert_eq!(
                machine.update(&motion_at(tenth, false), None),
                RiskLevel::Monitoring
            );
        }
        assert_eq!(machine.update(&motion_at(195, false), None), RiskLevel::Alert);
    }

    #[test]
    fn alert_recovers_and_reenters() {
        let mut machine = RiskStateMachine::new(ALERT_AFTER);
        let present = presence_at(0, true);
        machine.update(&motion_at(0, false), Some(&present));
        assert_eq!(machine.update(&motion_at(100, false), None), RiskLevel::Alert);
        assert_eq!(machine.update(&motion_at(101, true), None), RiskLevel::Active);
        assert_eq!(machine.update(&motion_at(201, false), None), RiskLevel::Alert);
    }

    #[test]
    fn presence_sample_turning_absent_clears_alert() {
        let mut machine = RiskStateMachine::new(ALERT_AFTER);
        let present = presence_at(0, true);
        machine.update(&motion_at(0, false), Some(&present));
        assert_eq!(machine.update(&motion_at(100, false), None), RiskLevel::Alert);
        let absent = presence_at(101, false);
        assert_eq!(
            machine.update(&motion_at(101, false), Some(&absent)),
            RiskLevel::NoSubject
        );
    }
}
