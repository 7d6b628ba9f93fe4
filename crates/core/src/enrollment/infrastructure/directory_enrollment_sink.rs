use std::fs;
use std::path::{Path, PathBuf};

use crate::enrollment::domain::enrollment_sink::{EnrollmentError, EnrollmentReport, EnrollmentSink};
use crate::shared::clock::Clock;
use crate::shared::constants::SAMPLE_EXTENSION;
use crate::tracking::domain::decision_engine::{Decision, Resolution};
use crate::video::domain::image_writer::ImageWriter;

/// Enrollment store laid out as `<root>/<label>/<sample>.png`.
///
/// New identities get their folder created; existing samples are never
/// overwritten.
pub struct DirectoryEnrollmentSink {
    root: PathBuf,
    writer: Box<dyn ImageWriter>,
    clock: Box<dyn Clock>,
}

impl DirectoryEnrollmentSink {
    pub fn new(root: &Path, writer: Box<dyn ImageWriter>, clock: Box<dyn Clock>) -> Self {
        Self {
            root: root.to_path_buf(),
            writer,
            clock,
        }
    }

    fn identity_dir(&self, decision: &Decision) -> Result<PathBuf, EnrollmentError> {
        let dir = self.root.join(decision.label());
        match decision {
            Decision::Enroll { .. } => {
                fs::create_dir_all(&dir).map_err(|e| EnrollmentError::CreateDir {
                    path: dir.clone(),
                    source: e,
                })?;
            }
            Decision::Reinforce { label, .. } => {
                if !dir.is_dir() {
                    return Err(EnrollmentError::MissingIdentity(label.clone()));
                }
            }
        }
        Ok(dir)
    }

    /// `<timestamp>.png`, or `<timestamp>_<n>.png` if that name is taken.
    fn free_sample_path(&self, dir: &Path) -> PathBuf {
        let stamp = self.clock.now_secs();
        let first = dir.join(format!("{stamp}.{SAMPLE_EXTENSION}"));
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| dir.join(format!("{stamp}_{n}.{SAMPLE_EXTENSION}")))
            .find(|p| !p.exists())
            .unwrap_or(first)
    }
}

impl EnrollmentSink for DirectoryEnrollmentSink {
    fn persist(&mut self, resolution: &Resolution) -> Result<EnrollmentReport, EnrollmentError> {
        let dir = self.identity_dir(&resolution.decision)?;
        let path = self.free_sample_path(&dir);
        self.writer
            .write(&path, &resolution.sample)
            .map_err(|e| EnrollmentError::WriteSample {
                path: path.clone(),
                message: e.to_string(),
            })?;
        log::info!("Sample saved to {}", path.display());
        Ok(EnrollmentReport {
            label: resolution.decision.label().to_string(),
            sample_path: path,
            new_identity: resolution.decision.is_new_identity(),
        })
    }
}
