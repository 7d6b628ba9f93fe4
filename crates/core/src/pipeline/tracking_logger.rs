use std::time::Instant;

/// Cross-cutting observer for tracking-loop events.
///
/// Decouples the frame loop from where its output goes (terminal, log
/// files, nothing at all). This is the headless stand-in for drawing
/// boxes and labels on a preview window.
pub trait TrackingLogger: Send {
    /// Report that frame `index` has been processed with `tracks` live tracks.
    fn frame(&mut self, index: usize, tracks: usize);

    /// Report the label a track is displayed with in the current frame.
    /// Called after [`TrackingLogger::frame`].
    fn track_label(&mut self, track_id: u32, label: &str);

    /// Report that a track was started.
    fn track_started(&mut self, track_id: u32);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Report that a sample was saved for `label`. Default: no-op.
    fn decision(&mut self, _label: &str, _new_identity: bool) {}

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullTrackingLogger;

impl TrackingLogger for NullTrackingLogger {
    fn frame(&mut self, _index: usize, _tracks: usize) {}
    fn track_label(&mut self, _track_id: u32, _label: &str) {}
    fn track_started(&mut self, _track_id: u32) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that counts frames, tracks and decisions and reports
/// a summary at the end of the run.
///
/// Per-frame output is throttled to every `throttle_frames` frames.
pub struct StdoutTrackingLogger {
    throttle_frames: usize,
    start_time: Instant,
    frames: usize,
    current_frame: usize,
    tracks_started: usize,
    enrolled: usize,
    reinforced: usize,
}

impl StdoutTrackingLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            start_time: Instant::now(),
            frames: 0,
            current_frame: 0,
            tracks_started: 0,
            enrolled: 0,
            reinforced: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no frame was seen.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Tracking summary ({} frames, {elapsed:.1}s total):",
            self.frames
        )];
        lines.push(format!("  Tracks started: {}", self.tracks_started));
        lines.push(format!(
            "  Decisions: {} ({} enrolled, {} reinforced)",
            self.enrolled + self.reinforced,
            self.enrolled,
            self.reinforced
        ));
        if elapsed > 0.0 {
            let fps = self.frames as f64 / elapsed;
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }
        Some(lines.join("\n"))
    }

    fn is_reported(&self, index: usize) -> bool {
        index % self.throttle_frames == 0
    }
}

impl Default for StdoutTrackingLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl TrackingLogger for StdoutTrackingLogger {
    fn frame(&mut self, index: usize, tracks: usize) {
        self.frames += 1;
        self.current_frame = index;
        if self.is_reported(index) {
            log::info!("Frame {index}: {tracks} face(s) tracked");
        }
    }

    fn track_label(&mut self, track_id: u32, label: &str) {
        if self.is_reported(self.current_frame) {
            log::info!("  [{track_id}] {label}");
        }
    }

    fn track_started(&mut self, track_id: u32) {
        self.tracks_started += 1;
        log::debug!("Tracking new face {track_id}");
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn decision(&mut self, label: &str, new_identity: bool) {
        if new_identity {
            self.enrolled += 1;
            log::info!("Enrolled new identity '{label}'");
        } else {
            self.reinforced += 1;
            log::info!("Added sample to '{label}'");
        }
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
