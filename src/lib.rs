//! Poolwatch - drowning-risk monitoring over a video frame stream.
//!
//! This crate implements the temporal risk pipeline that turns raw video
//! frames into deduplicated distress alerts:
//!
//! frame source -> motion diff -> (every Nth frame) person classifier
//!              -> risk state machine -> alert dispatch
//!
//! # Invariants
//!
//! 1. **Frame ordering**: frames are processed in stream order by a single
//!    monitor loop; risk state is never mutated concurrently.
//! 2. **Fail-open presence**: a failing or timed-out detector never clears
//!    previously confirmed presence. Losing the classifier must not mask an
//!    active monitoring session.
//! 3. **Edge-triggered alerts**: one alert per unbroken ALERT episode. A
//!    sustained episode emits again only after the level drops and re-enters.
//! 4. **Append-only sink**: alerts are persisted in emission order and never
//!    edited or deleted.
//! 5. **No backpressure from alerting**: persistence and notification run off
//!    the hot path and cannot stall frame intake.
//!
//! # Module Structure
//!
//! - `frame`: owned pixel buffers flowing through the pipeline
//! - `ingest`: frame sources (synthetic stub source for tests and demos)
//! - `motion`: frame-to-frame motion detection
//! - `detect`: person detector interface, backends, sampled invocation
//! - `risk`: motion/presence fusion into a risk level
//! - `alert`: alert records and edge-triggered dispatch
//! - `storage`: durable alert sink (SQLite, in-memory)
//! - `notify`: best-effort notification channels (log, MQTT)
//! - `monitor`: the per-feed monitor loop and the off-path alert writer
//! - `config`: daemon configuration (file + environment + validation)

use std::time::{SystemTime, UNIX_EPOCH};

pub mod alert;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod monitor;
pub mod motion;
pub mod notify;
pub mod risk;
pub mod storage;

pub use alert::{Alert, AlertDispatcher, DROWNING_ALERT};
pub use detect::{
    builtin_registry, DetectorError, DetectorRegistry, PersonDetector, PresenceSample,
    SampledClassifier, ScriptedDetector, StubDetector,
};
pub use frame::Frame;
pub use ingest::{frame_timestamp, FrameSource, SyntheticConfig, SyntheticSource};
pub use monitor::{AlertWriter, AlertWriterHandle, Monitor, MonitorSettings, MonitorSummary};
pub use motion::{FrameDiffer, MotionError, MotionSample};
pub use notify::{LogNotifier, MqttNotifier, MqttSettings, Notifier};
pub use risk::{RiskLevel, RiskState, RiskStateMachine};
pub use storage::{AlertSink, InMemoryAlertStore, SinkError, SqliteAlertStore};

/// Current wall-clock time as whole seconds since the Unix epoch.
///
/// Clamps to zero if the system clock reports a pre-epoch time.
pub fn unix_now_s() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
