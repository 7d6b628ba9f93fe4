use std::path::Path;

use crate::recognition::domain::face_recognizer::{FaceRecognizer, Recognition};
use crate::recognition::infrastructure::lbph_model::{LbphModel, LbphModelError};
use crate::shared::frame::Frame;

/// [`FaceRecognizer`] backed by a trained [`LbphModel`].
///
/// Without a model (first run, nothing enrolled yet) every query answers
/// [`Recognition::none`], which lets the tracker enroll the first faces.
pub struct LbphRecognizer {
    model: Option<LbphModel>,
}

impl LbphRecognizer {
    pub fn new(model: LbphModel) -> Self {
        Self { model: Some(model) }
    }

    pub fn untrained() -> Self {
        Self { model: None }
    }

    /// Loads the model at `path`, or starts untrained if no file exists.
    ///
    /// A file that exists but cannot be read is an error.
    pub fn load_or_untrained(path: &Path) -> Result<Self, LbphModelError> {
        if !path.exists() {
            log::warn!(
                "Recognition model {} not found, starting in learning mode",
                path.display()
            );
            return Ok(Self::untrained());
        }
        let model = LbphModel::load(path)?;
        log::info!(
            "Loaded recognition model {} ({} samples)",
            path.display(),
            model.len()
        );
        Ok(Self::new(model))
    }

    #[cfg(test)]
    fn is_trained(&self) -> bool {
        self.model.as_ref().is_some_and(|m| !m.is_empty())
    }
}

impl FaceRecognizer for LbphRecognizer {
    fn recognize(&self, face: &Frame) -> Recognition {
        let face = face.to_grayscale();
        match self.model.as_ref().and_then(|m| m.predict(&face)) {
            Some((identity, distance)) => Recognition::new(Some(identity), distance),
            None => Recognition::none(),
        }
    }
}
