use crate::recognition::domain::face_recognizer::Recognition;
use crate::shared::constants::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_STABILITY_FRAMES};

/// Where a track stands on the way to a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackStage {
    /// Last observation was confidently recognized.
    Fresh,
    /// `n` consecutive unrecognized observations, still below the threshold.
    Accumulating(u32),
    /// Enough consecutive unrecognized observations to decide.
    Resolved,
}

/// Counter rules shared by the correlator and the decision engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StabilityPolicy {
    pub confidence_threshold: f64,
    pub stability_frames: u32,
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            stability_frames: DEFAULT_STABILITY_FRAMES,
        }
    }
}

impl StabilityPolicy {
    pub fn new(confidence_threshold: f64, stability_frames: u32) -> Self {
        Self {
            confidence_threshold,
            stability_frames,
        }
    }

    /// Next unstable count after one observation.
    ///
    /// `previous` is `None` for a track created this frame.
    pub fn next_count(&self, previous: Option<u32>, recognition: &Recognition) -> u32 {
        if recognition.clears(self.confidence_threshold) {
            0
        } else {
            previous.unwrap_or(0).saturating_add(1)
        }
    }

    pub fn stage(&self, unstable_count: u32) -> TrackStage {
        match unstable_count {
            0 => TrackStage::Fresh,
            n if n >= self.stability_frames => TrackStage::Resolved,
            n => TrackStage::Accumulating(n),
        }
    }
}
