/// Nearest-centroid frame-to-frame correlation.
///
/// Each surviving track claims the closest still-unclaimed observation whose
/// centroid lies strictly inside the distance gate. Tracks are served in
/// their existing order and ties go to the earlier observation, so the
/// matching is 1:1 and deterministic. Tracks that claim nothing are dropped;
/// observations nobody claims start new tracks.
use crate::shared::bounding_box::Point;
use crate::tracking::domain::stability_policy::StabilityPolicy;
use crate::tracking::domain::track::{Observation, Track, TrackSet};

/// Result of correlating one frame.
#[derive(Debug)]
pub struct Correlation {
    pub tracks: TrackSet,
    /// Indices (into the frame's observations) that started new tracks.
    pub unmatched: Vec<usize>,
    /// IDs of previous tracks that found no observation.
    pub dropped: Vec<u32>,
}

pub struct TrackCorrelator {
    max_distance: f64,
    policy: StabilityPolicy,
}

impl TrackCorrelator {
    pub fn new(max_distance: f64, policy: StabilityPolicy) -> Self {
        Self {
            max_distance,
            policy,
        }
    }

    pub fn policy(&self) -> &StabilityPolicy {
        &self.policy
    }

    /// Consumes the previous frame's tracks and produces the next set.
    pub fn correlate(&self, previous: TrackSet, observations: Vec<Observation>) -> Correlation {
        let (old_tracks, mut next_id) = previous.into_parts();
        let mut pool: Vec<Option<Observation>> = observations.into_iter().map(Some).collect();
        let mut tracks = Vec::with_capacity(pool.len());
        let mut dropped = Vec::new();

        for track in old_tracks {
            let claimed = self
                .nearest(&track.centroid, &pool)
                .and_then(|i| pool[i].take());
            match claimed {
                Some(observation) => {
                    let count = self
                        .policy
                        .next_count(Some(track.unstable_count), &observation.recognition);
                    tracks.push(Track::from_observation(track.id, observation, count));
                }
                None => {
                    log::debug!("Track {} lost", track.id);
                    dropped.push(track.id);
                }
            }
        }

        let mut unmatched = Vec::new();
        for (index, slot) in pool.into_iter().enumerate() {
            let Some(observation) = slot else {
                continue;
            };
            let count = self.policy.next_count(None, &observation.recognition);
            tracks.push(Track::from_observation(next_id, observation, count));
            log::debug!("Track {next_id} started");
            next_id = next_id.wrapping_add(1);
            unmatched.push(index);
        }

        Correlation {
            tracks: TrackSet::from_parts(tracks, next_id),
            unmatched,
            dropped,
        }
    }

    fn nearest(&self, centroid: &Point, pool: &[Option<Observation>]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, slot) in pool.iter().enumerate() {
            let Some(observation) = slot else {
                continue;
            };
            let dist = centroid.distance_to(&observation.centroid());
            if dist >= self.max_distance {
                continue;
            }
            if best.map_or(true, |(_, best_dist)| dist < best_dist) {
                best = Some((i, dist));
            }
        }
        best.map(|(i, _)| i)
    }
}
