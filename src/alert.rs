//! Alert records and edge-triggered dispatch.

use serde::{Deserialize, Serialize};

use crate::risk::{RiskLevel, RiskState};
use crate::unix_now_s;

/// Alert type recorded for a suspected-drowning escalation.
pub const DROWNING_ALERT: &str = "DROWNING_ALERT";

/// A persisted alert. Immutable after creation; the sink is append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: String,
    pub details: String,
    /// Wall-clock creation time, whole seconds since the Unix epoch.
    pub created_at: u64,
}

impl Alert {
    pub fn new(alert_type: &str, details: String) -> Self {
        Self {
            alert_type: alert_type.to_string(),
            details,
            created_at: unix_now_s(),
        }
    }
}

/// Turns risk-level transitions into deduplicated alerts.
///
/// Emission is edge-triggered: an alert is created only on the transition
/// into `Alert` from any other level. A sustained episode therefore produces
/// exactly one alert until the level drops below `Alert` and re-enters.
///
/// Dispatcher state lives and dies with its monitor. A monitor restarted in
/// the middle of an episode starts disarmed and will emit again for that
/// episode; restart-within-episode deduplication is not supported.
pub struct AlertDispatcher {
    in_alert: bool,
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self { in_alert: false }
    }

    /// Observe the level for the current frame. Returns a new alert only on
    /// the entering edge.
    pub fn on_level(&mut self, level: RiskLevel, state: &RiskState) -> Option<Alert> {
        let entering = level == RiskLevel::Alert && !self.in_alert;
        self.in_alert = level == RiskLevel::Alert;
        if !entering {
            return None;
        }
        let details = format!(
            "no motion for {:.1}s (stream offset {:.1}s)",
            state.stalled_for().as_secs_f64(),
            state.last_observed.as_secs_f64()
        );
        Some(Alert::new(DROWNING_ALERT, details))
    }
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn state_stalled_for(secs: u64) -> RiskState {
        RiskState {
            last_motion: Some(Duration::from_secs(2)),
            human_present: Some(true),
            last_observed: Duration::from_secs(2 + secs),
            current_level: RiskLevel::Alert,
        }
    }

    #[test]
    fn emits_only_on_entering_edge() {
        let mut dispatcher = AlertDispatcher::new();
        let state = state_stalled_for(10);

        assert!(dispatcher.on_level(RiskLevel::Monitoring, &state).is_none());
        assert!(dispatcher.on_level(RiskLevel::Alert, &state).is_some());
        // Sustained episode: no further alerts.
        for _ in 0..50 {
            assert!(dispatcher.on_level(RiskLevel::Alert, &state).is_none());
        }
    }

    #[test]
    fn rearms_after_level_drops() {
        let mut dispatcher = AlertDispatcher::new();
        let state = state_stalled_for(10);

        assert!(dispatcher.on_level(RiskLevel::Alert, &state).is_some());
        assert!(dispatcher.on_level(RiskLevel::Active, &state).is_none());
        assert!(dispatcher.on_level(RiskLevel::Alert, &state).is_some());
    }

    #[test]
    fn alert_details_carry_stalled_time() {
        let mut dispatcher = AlertDispatcher::new();
        let alert = dispatcher
            .on_level(RiskLevel::Alert, &state_stalled_for(12))
            .unwrap();
        assert_eq!(alert.alert_type, DROWNING_ALERT);
        assert!(alert.details.contains("12.0s"));
    }

    #[test]
    fn alert_serializes_to_json() {
        let alert = Alert::new(DROWNING_ALERT, "no motion for 10.0s".to_string());
        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("DROWNING_ALERT"));
        let back: Alert = serde_json::from_str(&json).unwrap();
        assert_eq!(back, alert);
    }
}
