use std::time::Duration;

/// Result of classifying one sampled frame for human presence.
///
/// Presence is sparsely sampled: the most recent sample defines presence
/// until a newer one supersedes it. Samples are never interpolated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresenceSample {
    pub frame_index: u64,
    pub timestamp: Duration,
    pub human_present: bool,
    /// How many person-sized detections the backend reported.
    pub detection_count: u32,
}
