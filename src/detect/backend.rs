use anyhow::Result;
use std::time::Duration;
use thiserror::Error;

use crate::detect::result::PresenceSample;
use crate::frame::Frame;

/// Errors a detector backend may surface.
///
/// All of these are treated as "no new presence information" by the caller:
/// the pipeline keeps the last known presence rather than marking the subject
/// absent. Falsely clearing presence is the unsafe error direction.
#[derive(Clone, Debug, Error)]
pub enum DetectorError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),
    #[error("detection timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed detector input: {0}")]
    MalformedInput(String),
}

/// Person detector backend.
///
/// Detection is assumed orders of magnitude more expensive than motion
/// diffing; callers rate-limit invocations through `SampledClassifier`.
///
/// Implementations MUST:
/// - Bound any blocking work (network, heavy compute) by `timeout` and
///   return `DetectorError::Timeout` when exceeded
/// - Treat the frame as read-only and ephemeral
/// - Never block the caller for unbounded time
pub trait PersonDetector: Send {
    /// Backend identifier, used for registry lookup and logging.
    fn name(&self) -> &'static str;

    /// Classify one frame for human presence.
    fn detect(&mut self, frame: &Frame, timeout: Duration) -> Result<PresenceSample, DetectorError>;

    /// Optional warm-up hook (model load, connection setup).
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
