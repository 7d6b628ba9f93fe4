use std::path::Path;

use crate::shared::frame::Frame;

/// Domain interface for loading still images from disk.
pub trait ImageReader: Send {
    /// Reads an image as a single-channel grayscale frame.
    fn read_grayscale(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
