use crate::catalog::identity_catalog::IdentityCatalog;
use crate::detection::domain::face_detector::FaceDetector;
use crate::enrollment::domain::enrollment_sink::{EnrollmentReport, EnrollmentSink};
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::shared::constants::{EXIT_RETRAIN, EXIT_STOPPED};
use crate::shared::frame::Frame;
use crate::tracking::domain::decision_engine::DecisionEngine;
use crate::tracking::domain::stability_policy::StabilityPolicy;
use crate::tracking::domain::track::{Observation, Track, TrackSet};
use crate::tracking::domain::track_correlator::TrackCorrelator;
use crate::video::domain::frame_source::{FrameSource, SourceGuard};

use super::interrupt_signal::InterruptSignal;
use super::tracking_logger::TrackingLogger;

/// Label shown for a confidently recognized face that the catalog does not
/// name.
const UNKNOWN_LABEL: &str = "Unknown";

/// How a tracking run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The user asked to stop.
    Interrupted,
    /// The frame source ran dry or stopped delivering frames.
    SourceExhausted,
    /// A decision fired and its sample was persisted.
    RetrainRequested(EnrollmentReport),
}

impl RunOutcome {
    /// Process exit status understood by the supervisor.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Interrupted | RunOutcome::SourceExhausted => EXIT_STOPPED,
            RunOutcome::RetrainRequested(_) => EXIT_RETRAIN,
        }
    }
}

/// Runs the single-threaded tracking loop over one frame source.
///
/// Each frame is acquired, detected, recognized, correlated and evaluated
/// before the next one is read. The loop ends on the first decision, on a
/// user interrupt or when the source stops delivering frames; the source is
/// closed on every one of those paths, and on errors.
pub struct TrackFacesUseCase {
    source: Box<dyn FrameSource>,
    location: String,
    detector: Box<dyn FaceDetector>,
    recognizer: Box<dyn FaceRecognizer>,
    catalog: IdentityCatalog,
    correlator: TrackCorrelator,
    engine: DecisionEngine,
    sink: Box<dyn EnrollmentSink>,
    interrupt: Box<dyn InterruptSignal>,
    logger: Box<dyn TrackingLogger>,
}

impl TrackFacesUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FrameSource>,
        location: &str,
        detector: Box<dyn FaceDetector>,
        recognizer: Box<dyn FaceRecognizer>,
        catalog: IdentityCatalog,
        correlator: TrackCorrelator,
        engine: DecisionEngine,
        sink: Box<dyn EnrollmentSink>,
        interrupt: Box<dyn InterruptSignal>,
        logger: Box<dyn TrackingLogger>,
    ) -> Self {
        Self {
            source,
            location: location.to_string(),
            detector,
            recognizer,
            catalog,
            correlator,
            engine,
            sink,
            interrupt,
            logger,
        }
    }

    pub fn execute(&mut self) -> Result<RunOutcome, Box<dyn std::error::Error>> {
        self.source.open(&self.location)?;
        self.logger.info(&format!(
            "Tracking faces from {} ({} known identities)",
            self.location,
            self.catalog.len()
        ));

        let mut guard = SourceGuard::new(self.source.as_mut());
        let mut tracks = TrackSet::new();

        let outcome = loop {
            let frame = match guard.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.logger.info("Frame source exhausted");
                    break RunOutcome::SourceExhausted;
                }
                Err(e) => {
                    log::warn!("Failed to read frame from {}: {e}", self.location);
                    self.logger.info("Frame source failed, stopping");
                    break RunOutcome::SourceExhausted;
                }
            };

            let observations = observe(self.detector.as_mut(), self.recognizer.as_ref(), &frame)?;
            let correlation = self.correlator.correlate(tracks, observations);
            tracks = correlation.tracks;

            let first_new = tracks.len() - correlation.unmatched.len();
            for track in &tracks.tracks()[first_new..] {
                self.logger.track_started(track.id);
            }
            self.logger.frame(frame.index(), tracks.len());
            let policy = self.correlator.policy();
            for track in tracks.tracks() {
                let label = display_label(track, &self.catalog, policy);
                self.logger.track_label(track.id, &label);
            }

            if let Some(resolution) = self.engine.evaluate(&tracks, &self.catalog) {
                let report = self.sink.persist(&resolution)?;
                self.logger.decision(&report.label, report.new_identity);
                self.logger.info(&format!(
                    "Saved sample for '{}' to {}, retraining requested",
                    report.label,
                    report.sample_path.display()
                ));
                break RunOutcome::RetrainRequested(report);
            }

            if self.interrupt.requested() {
                self.logger.info("Stop requested");
                break RunOutcome::Interrupted;
            }
        };

        drop(guard);
        self.logger.summary();
        Ok(outcome)
    }
}

/// Detects faces and recognizes each grayscale crop.
///
/// Boxes that fall entirely outside the frame are skipped.
fn observe(
    detector: &mut dyn FaceDetector,
    recognizer: &dyn FaceRecognizer,
    frame: &Frame,
) -> Result<Vec<Observation>, Box<dyn std::error::Error>> {
    let boxes = detector.detect(frame)?;
    let mut observations = Vec::with_capacity(boxes.len());
    for bbox in boxes {
        let Some(crop) = frame.crop(&bbox) else {
            log::debug!("Frame {}: skipping box outside frame {bbox:?}", frame.index());
            continue;
        };
        let sample = crop.to_grayscale();
        let recognition = recognizer.recognize(&sample);
        observations.push(Observation::new(bbox, recognition, sample));
    }
    Ok(observations)
}

/// Text a track would be drawn with on a preview.
fn display_label(track: &Track, catalog: &IdentityCatalog, policy: &StabilityPolicy) -> String {
    if track.unstable_count == 0 {
        return track
            .best_identity
            .and_then(|id| catalog.label(id))
            .unwrap_or(UNKNOWN_LABEL)
            .to_string();
    }
    format!(
        "New face? ({}/{})",
        track.unstable_count, policy.stability_frames
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::domain::enrollment_sink::EnrollmentError;
    use crate::pipeline::interrupt_signal::NeverInterrupt;
    use crate::pipeline::tracking_logger::NullTrackingLogger;
    use crate::recognition::domain::face_recognizer::Recognition;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::clock::FixedClock;
    use crate::tracking::domain::decision_engine::{Decision, Resolution};
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // ── Stubs ──────────────────────────────────────────────────────────

    struct StubSource {
        frames: VecDeque<Frame>,
        closed: Arc<Mutex<usize>>,
        fail_open: bool,
        fail_at: Option<usize>,
        reads: usize,
    }

    impl StubSource {
        fn new(count: usize) -> Self {
            Self {
                frames: (0..count)
                    .map(|i| Frame::new(vec![128; 640 * 480 * 3], 640, 480, 3, i))
                    .collect(),
                closed: Arc::new(Mutex::new(0)),
                fail_open: false,
                fail_at: None,
                reads: 0,
            }
        }
    }

    impl FrameSource for StubSource {
        fn open(&mut self, _location: &str) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("no such device".into());
            }
            Ok(())
        }

        fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            let read = self.reads;
            self.reads += 1;
            if self.fail_at == Some(read) {
                return Err("device disconnected".into());
            }
            Ok(self.frames.pop_front())
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() += 1;
        }
    }

    /// Records the decisions it is told about.
    struct DecisionLogger {
        decisions: Arc<Mutex<Vec<(String, bool)>>>,
    }

    impl TrackingLogger for DecisionLogger {
        fn frame(&mut self, _index: usize, _tracks: usize) {}
        fn track_label(&mut self, _track_id: u32, _label: &str) {}
        fn track_started(&mut self, _track_id: u32) {}
        fn info(&mut self, _message: &str) {}
        fn decision(&mut self, label: &str, new_identity: bool) {
            self.decisions
                .lock()
                .unwrap()
                .push((label.to_string(), new_identity));
        }
    }

    /// Reports the same boxes on every frame, or an error from `fail_at`.
    struct StubDetector {
        boxes: Vec<BoundingBox>,
        fail_at: Option<usize>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            if self.fail_at == Some(frame.index()) {
                return Err("inference failed".into());
            }
            Ok(self.boxes.clone())
        }
    }

    /// Answers from a script indexed by frame; the last entry repeats.
    struct ScriptedRecognizer {
        script: Vec<Recognition>,
    }

    impl FaceRecognizer for ScriptedRecognizer {
        fn recognize(&self, face: &Frame) -> Recognition {
            let i = face.index().min(self.script.len() - 1);
            self.script[i]
        }
    }

    #[derive(Default)]
    struct MemorySink {
        persisted: Arc<Mutex<Vec<Resolution>>>,
    }

    impl EnrollmentSink for MemorySink {
        fn persist(&mut self, resolution: &Resolution) -> Result<EnrollmentReport, EnrollmentError> {
            self.persisted.lock().unwrap().push(resolution.clone());
            Ok(EnrollmentReport {
                label: resolution.decision.label().to_string(),
                sample_path: PathBuf::from("memory.png"),
                new_identity: resolution.decision.is_new_identity(),
            })
        }
    }

    struct FailingSink;

    impl EnrollmentSink for FailingSink {
        fn persist(&mut self, _resolution: &Resolution) -> Result<EnrollmentReport, EnrollmentError> {
            Err(EnrollmentError::MissingIdentity("alice".into()))
        }
    }

    /// Requests a stop once `after` polls have happened.
    struct CountdownInterrupt {
        after: usize,
    }

    impl InterruptSignal for CountdownInterrupt {
        fn requested(&mut self) -> bool {
            if self.after == 0 {
                return true;
            }
            self.after -= 1;
            false
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    const NOW: u64 = 1_700_000_000;

    fn face() -> BoundingBox {
        BoundingBox::new(300, 200, 60, 60)
    }

    fn build(
        source: StubSource,
        detector: StubDetector,
        script: Vec<Recognition>,
        catalog: IdentityCatalog,
        sink: Box<dyn EnrollmentSink>,
        interrupt: Box<dyn InterruptSignal>,
    ) -> TrackFacesUseCase {
        let policy = StabilityPolicy::new(90.0, 5);
        TrackFacesUseCase::new(
            Box::new(source),
            "/dev/video0",
            Box::new(detector),
            Box::new(ScriptedRecognizer { script }),
            catalog,
            TrackCorrelator::new(75.0, policy),
            DecisionEngine::new(policy, Box::new(FixedClock(NOW))),
            sink,
            interrupt,
            Box::new(NullTrackingLogger),
        )
    }

    fn one_face() -> StubDetector {
        StubDetector {
            boxes: vec![face()],
            fail_at: None,
        }
    }

    // ── Outcomes ───────────────────────────────────────────────────────

    #[test]
    fn test_unknown_face_enrolls_and_requests_retrain() {
        let sink = MemorySink::default();
        let persisted = sink.persisted.clone();
        let source = StubSource::new(50);
        let closed = source.closed.clone();

        let outcome = build(
            source,
            one_face(),
            vec![Recognition::none()],
            IdentityCatalog::default(),
            Box::new(sink),
            Box::new(NeverInterrupt),
        )
        .execute()
        .unwrap();

        let RunOutcome::RetrainRequested(report) = &outcome else {
            panic!("expected retrain, got {outcome:?}");
        };
        assert!(report.new_identity);
        assert_eq!(report.label, format!("person_{NOW}"));
        assert_eq!(outcome.exit_code(), 10);

        let persisted = persisted.lock().unwrap();
        assert_eq!(persisted.len(), 1);
        // Fifth frame (index 4) is the one that reaches the threshold
        assert_eq!(persisted[0].sample.index(), 4);
        assert_eq!(persisted[0].sample.channels(), 1);
        assert_eq!(persisted[0].sample.width(), 60);
        assert_eq!(*closed.lock().unwrap(), 1);
    }

    #[test]
    fn test_weak_match_reinforces_known_identity() {
        let sink = MemorySink::default();
        let persisted = sink.persisted.clone();
        let outcome = build(
            StubSource::new(50),
            one_face(),
            vec![Recognition::new(Some(1), 95.0)],
            IdentityCatalog::from_labels(["alice", "bob"]),
            Box::new(sink),
            Box::new(NeverInterrupt),
        )
        .execute()
        .unwrap();

        assert_eq!(outcome.exit_code(), 10);
        assert_eq!(
            persisted.lock().unwrap()[0].decision,
            Decision::Reinforce {
                identity: 1,
                label: "bob".into()
            }
        );
    }

    #[test]
    fn test_recognized_face_runs_until_source_exhausted() {
        let source = StubSource::new(30);
        let closed = source.closed.clone();
        let outcome = build(
            source,
            one_face(),
            vec![Recognition::new(Some(0), 40.0)],
            IdentityCatalog::from_labels(["alice"]),
            Box::new(MemorySink::default()),
            Box::new(NeverInterrupt),
        )
        .execute()
        .unwrap();

        assert_eq!(outcome, RunOutcome::SourceExhausted);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(*closed.lock().unwrap(), 1);
    }

    #[test]
    fn test_interrupt_stops_before_decision() {
        let sink = MemorySink::default();
        let persisted = sink.persisted.clone();
        let source = StubSource::new(50);
        let closed = source.closed.clone();
        let outcome = build(
            source,
            one_face(),
            vec![Recognition::none()],
            IdentityCatalog::default(),
            Box::new(sink),
            Box::new(CountdownInterrupt { after: 2 }),
        )
        .execute()
        .unwrap();

        assert_eq!(outcome, RunOutcome::Interrupted);
        assert_eq!(outcome.exit_code(), 0);
        assert!(persisted.lock().unwrap().is_empty());
        assert_eq!(*closed.lock().unwrap(), 1);
    }

    #[test]
    fn test_decision_takes_priority_over_interrupt_on_same_frame() {
        let outcome = build(
            StubSource::new(50),
            one_face(),
            vec![Recognition::none()],
            IdentityCatalog::default(),
            Box::new(MemorySink::default()),
            Box::new(CountdownInterrupt { after: 4 }),
        )
        .execute()
        .unwrap();
        assert_eq!(outcome.exit_code(), 10);
    }

    #[test]
    fn test_recovering_recognition_resets_accumulation() {
        // 4 unstable frames, one confident, then unstable again: with a
        // threshold of 5 the decision lands on frame index 9, not 4.
        let mut script = vec![Recognition::none(); 4];
        script.push(Recognition::new(Some(0), 10.0));
        script.push(Recognition::none());
        let sink = MemorySink::default();
        let persisted = sink.persisted.clone();

        build(
            StubSource::new(50),
            one_face(),
            script,
            IdentityCatalog::from_labels(["alice"]),
            Box::new(sink),
            Box::new(NeverInterrupt),
        )
        .execute()
        .unwrap();

        assert_eq!(persisted.lock().unwrap()[0].sample.index(), 9);
    }

    #[test]
    fn test_decision_is_reported_to_logger_once() {
        let decisions = Arc::new(Mutex::new(Vec::new()));
        let policy = StabilityPolicy::new(90.0, 5);
        let outcome = TrackFacesUseCase::new(
            Box::new(StubSource::new(50)),
            "/dev/video0",
            Box::new(one_face()),
            Box::new(ScriptedRecognizer {
                script: vec![Recognition::none()],
            }),
            IdentityCatalog::default(),
            TrackCorrelator::new(75.0, policy),
            DecisionEngine::new(policy, Box::new(FixedClock(NOW))),
            Box::new(MemorySink::default()),
            Box::new(NeverInterrupt),
            Box::new(DecisionLogger {
                decisions: decisions.clone(),
            }),
        )
        .execute()
        .unwrap();

        assert_eq!(outcome.exit_code(), 10);
        assert_eq!(
            *decisions.lock().unwrap(),
            vec![(format!("person_{NOW}"), true)]
        );
    }

    // ── Errors ─────────────────────────────────────────────────────────

    #[test]
    fn test_open_failure_is_an_error() {
        let mut source = StubSource::new(5);
        source.fail_open = true;
        let result = build(
            source,
            one_face(),
            vec![Recognition::none()],
            IdentityCatalog::default(),
            Box::new(MemorySink::default()),
            Box::new(NeverInterrupt),
        )
        .execute();
        assert!(result.is_err());
    }

    #[test]
    fn test_read_failure_mid_run_stops_gracefully() {
        let mut source = StubSource::new(10);
        source.fail_at = Some(3);
        let closed = source.closed.clone();
        let sink = MemorySink::default();
        let persisted = sink.persisted.clone();

        let outcome = build(
            source,
            one_face(),
            vec![Recognition::none()],
            IdentityCatalog::default(),
            Box::new(sink),
            Box::new(NeverInterrupt),
        )
        .execute()
        .unwrap();

        assert_eq!(outcome, RunOutcome::SourceExhausted);
        assert_eq!(outcome.exit_code(), 0);
        assert!(persisted.lock().unwrap().is_empty());
        assert_eq!(*closed.lock().unwrap(), 1);
    }

    #[test]
    fn test_read_failure_on_first_frame_is_not_fatal() {
        let mut source = StubSource::new(10);
        source.fail_at = Some(0);
        let outcome = build(
            source,
            one_face(),
            vec![Recognition::none()],
            IdentityCatalog::default(),
            Box::new(MemorySink::default()),
            Box::new(NeverInterrupt),
        )
        .execute()
        .unwrap();
        assert_eq!(outcome, RunOutcome::SourceExhausted);
    }

    #[test]
    fn test_detector_error_propagates_and_releases_source() {
        let source = StubSource::new(10);
        let closed = source.closed.clone();
        let result = build(
            source,
            StubDetector {
                boxes: vec![face()],
                fail_at: Some(2),
            },
            vec![Recognition::none()],
            IdentityCatalog::default(),
            Box::new(MemorySink::default()),
            Box::new(NeverInterrupt),
        )
        .execute();
        assert!(result.is_err());
        assert_eq!(*closed.lock().unwrap(), 1);
    }

    #[test]
    fn test_sink_error_propagates() {
        let result = build(
            StubSource::new(10),
            one_face(),
            vec![Recognition::none()],
            IdentityCatalog::default(),
            Box::new(FailingSink),
            Box::new(NeverInterrupt),
        )
        .execute();
        assert!(result.unwrap_err().to_string().contains("alice"));
    }

    #[test]
    fn test_boxes_outside_frame_are_ignored() {
        let outcome = build(
            StubSource::new(10),
            StubDetector {
                boxes: vec![BoundingBox::new(900, 900, 50, 50)],
                fail_at: None,
            },
            vec![Recognition::none()],
            IdentityCatalog::default(),
            Box::new(MemorySink::default()),
            Box::new(NeverInterrupt),
        )
        .execute()
        .unwrap();
        assert_eq!(outcome, RunOutcome::SourceExhausted);
    }

    // ── Labels ─────────────────────────────────────────────────────────

    fn track_with(identity: Option<u32>, confidence: f64, count: u32) -> Track {
        let observation = Observation::new(
            face(),
            Recognition::new(identity, confidence),
            Frame::new(vec![0; 4], 2, 2, 1, 0),
        );
        Track::from_observation(0, observation, count)
    }

    #[test]
    fn test_display_label() {
        let catalog = IdentityCatalog::from_labels(["alice"]);
        let policy = StabilityPolicy::new(90.0, 20);
        assert_eq!(
            display_label(&track_with(Some(0), 30.0, 0), &catalog, &policy),
            "alice"
        );
        assert_eq!(
            display_label(&track_with(Some(5), 30.0, 0), &catalog, &policy),
            "Unknown"
        );
        assert_eq!(
            display_label(&track_with(None, f64::INFINITY, 3), &catalog, &policy),
            "New face? (3/20)"
        );
    }
}
