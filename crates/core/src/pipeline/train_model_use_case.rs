use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::catalog::identity_catalog::{CatalogError, IdentityCatalog};
use crate::recognition::infrastructure::lbph_model::{LbphModel, LbphModelError};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::video::domain::image_reader::ImageReader;

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to list samples in {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Model(#[from] LbphModelError),
}

/// Result of a training run that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrainingOutcome {
    Trained { samples: usize, identities: usize },
    /// The enrollment directory holds no usable sample; no model was written.
    NoSamples,
}

/// Rebuilds the recognition model from every sample in the enrollment
/// directory and saves it for the next tracking run.
pub struct TrainModelUseCase {
    reader: Box<dyn ImageReader>,
    enrollment_dir: PathBuf,
    model_path: PathBuf,
    grid: u32,
}

impl TrainModelUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        enrollment_dir: &Path,
        model_path: &Path,
        grid: u32,
    ) -> Self {
        Self {
            reader,
            enrollment_dir: enrollment_dir.to_path_buf(),
            model_path: model_path.to_path_buf(),
            grid,
        }
    }

    pub fn execute(&self) -> Result<TrainingOutcome, TrainingError> {
        let catalog = IdentityCatalog::load(&self.enrollment_dir)?;
        let mut model = LbphModel::new(self.grid);
        let mut identities = 0;

        for (identifier, label) in catalog.iter() {
            let before = model.len();
            for path in sample_files(&self.enrollment_dir.join(label))? {
                self.add_sample(&mut model, identifier, &path);
            }
            let added = model.len() - before;
            log::debug!("{label}: {added} sample(s)");
            if added > 0 {
                identities += 1;
            }
        }

        if model.is_empty() {
            log::warn!(
                "No training samples under {}, model not written",
                self.enrollment_dir.display()
            );
            return Ok(TrainingOutcome::NoSamples);
        }

        model.save(&self.model_path)?;
        log::info!(
            "Trained on {} sample(s) of {identities} identities, saved to {}",
            model.len(),
            self.model_path.display()
        );
        Ok(TrainingOutcome::Trained {
            samples: model.len(),
            identities,
        })
    }

    fn add_sample(&self, model: &mut LbphModel, identifier: u32, path: &Path) {
        match self.reader.read_grayscale(path) {
            Ok(face) => {
                if !model.add(identifier, &face) {
                    log::warn!("Skipping {}: image too small", path.display());
                }
            }
            Err(e) => log::warn!("Skipping unreadable sample {}: {e}", path.display()),
        }
    }
}

/// Image files directly inside `dir`, sorted, hidden files excluded.
fn sample_files(dir: &Path) -> Result<Vec<PathBuf>, TrainingError> {
    let read_err = |e| TrainingError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && is_sample(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_sample(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    let known_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    !hidden && known_ext
}
