/// Turns a stable-but-unrecognized track into an enrollment decision.
///
/// A track resolves once its unstable count reaches the policy's threshold.
/// Its last recognizer guess then decides between reinforcing a known
/// identity (the guess names a catalog entry, however weak) and enrolling a
/// new one. The engine latches after the first decision and never fires
/// again.
use crate::catalog::identity_catalog::IdentityCatalog;
use crate::shared::clock::Clock;
use crate::shared::frame::Frame;
use crate::tracking::domain::stability_policy::{StabilityPolicy, TrackStage};
use crate::tracking::domain::track::{Track, TrackSet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Add a sample to an already enrolled identity.
    Reinforce { identity: u32, label: String },
    /// Create a new identity with its first sample.
    Enroll { label: String },
}

impl Decision {
    pub fn label(&self) -> &str {
        match self {
            Decision::Reinforce { label, .. } | Decision::Enroll { label } => label,
        }
    }

    pub fn is_new_identity(&self) -> bool {
        matches!(self, Decision::Enroll { .. })
    }
}

/// A fired decision together with the sample to persist.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub track_id: u32,
    pub decision: Decision,
    pub sample: Frame,
}

pub struct DecisionEngine {
    policy: StabilityPolicy,
    clock: Box<dyn Clock>,
    fired: bool,
}

impl DecisionEngine {
    pub fn new(policy: StabilityPolicy, clock: Box<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            fired: false,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Checks the frame's tracks in order and fires for the first resolved one.
    pub fn evaluate(&mut self, tracks: &TrackSet, catalog: &IdentityCatalog) -> Option<Resolution> {
        if self.fired {
            return None;
        }
        let track = tracks
            .tracks()
            .iter()
            .find(|t| self.policy.stage(t.unstable_count) == TrackStage::Resolved)?;

        let decision = self.classify(track, catalog);
        match &decision {
            Decision::Reinforce { label, .. } => log::info!(
                "Track {} is an unstable view of '{label}', reinforcing",
                track.id
            ),
            Decision::Enroll { label } => {
                log::info!("Track {} is a stable unknown face, enrolling '{label}'", track.id)
            }
        }
        self.fired = true;
        Some(Resolution {
            track_id: track.id,
            decision,
            sample: track.pending_sample.clone(),
        })
    }

    fn classify(&self, track: &Track, catalog: &IdentityCatalog) -> Decision {
        let known = track
            .best_identity
            .and_then(|id| catalog.label(id).map(|label| (id, label)));
        match known {
            Some((identity, label)) => Decision::Reinforce {
                identity,
                label: label.to_string(),
            },
            None => Decision::Enroll {
                label: catalog.fresh_label(self.clock.now_secs()),
            },
        }
    }
}
