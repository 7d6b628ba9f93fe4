use crate::recognition::domain::face_recognizer::Recognition;
use crate::shared::bounding_box::{BoundingBox, Point};
use crate::shared::frame::Frame;

/// One detected face in the current frame, already recognized.
#[derive(Clone, Debug)]
pub struct Observation {
    pub bbox: BoundingBox,
    pub recognition: Recognition,
    /// Grayscale face crop, kept so it can be enrolled later.
    pub sample: Frame,
}

impl Observation {
    pub fn new(bbox: BoundingBox, recognition: Recognition, sample: Frame) -> Self {
        Self {
            bbox,
            recognition,
            sample,
        }
    }

    pub fn centroid(&self) -> Point {
        self.bbox.centroid()
    }
}

/// A face followed across consecutive frames within one run.
#[derive(Clone, Debug)]
pub struct Track {
    pub id: u32,
    pub bbox: BoundingBox,
    pub centroid: Point,
    /// Most recent recognizer guess, kept whether or not it was confident.
    pub best_identity: Option<u32>,
    pub best_confidence: f64,
    /// Consecutive frames whose recognition did not clear the threshold.
    pub unstable_count: u32,
    pub pending_sample: Frame,
}

impl Track {
    pub(crate) fn from_observation(id: u32, observation: Observation, unstable_count: u32) -> Self {
        Self {
            id,
            bbox: observation.bbox,
            centroid: observation.centroid(),
            best_identity: observation.recognition.identity,
            best_confidence: observation.recognition.confidence,
            unstable_count,
            pending_sample: observation.sample,
        }
    }
}

/// All live tracks after a frame, in correlation order: surviving tracks
/// first (in their previous order), then tracks created this frame.
#[derive(Clone, Debug, Default)]
pub struct TrackSet {
    tracks: Vec<Track>,
    next_id: u32,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(tracks: Vec<Track>, next_id: u32) -> Self {
        Self { tracks, next_id }
    }

    pub(crate) fn into_parts(self) -> (Vec<Track>, u32) {
        (self.tracks, self.next_id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
