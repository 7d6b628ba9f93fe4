use std::path::PathBuf;

use thiserror::Error;

use crate::tracking::domain::decision_engine::Resolution;

#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("failed to create identity folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("identity folder for '{0}' does not exist")]
    MissingIdentity(String),
    #[error("failed to write sample {path}: {message}")]
    WriteSample { path: PathBuf, message: String },
}

/// What a successful enrollment wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrollmentReport {
    pub label: String,
    pub sample_path: PathBuf,
    pub new_identity: bool,
}

/// Persists the sample behind a decision into the enrollment store.
pub trait EnrollmentSink: Send {
    fn persist(&mut self, resolution: &Resolution) -> Result<EnrollmentReport, EnrollmentError>;
}
