use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;

/// Loads enrollment samples with the `image` crate.
///
/// Any format the crate can decode is accepted; colour images are converted
/// to luma on load.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read_grayscale(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::open(path)?.to_luma8();
        let (width, height) = img.dimensions();
        Ok(Frame::new(img.into_raw(), width, height, 1, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_grayscale_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        let data: Vec<u8> = (0..24u8).collect();
        image::GrayImage::from_raw(6, 4, data.clone())
            .unwrap()
            .save(&path)
            .unwrap();

        let frame = ImageFileReader::new().read_grayscale(&path).unwrap();
        assert_eq!((frame.width(), frame.height(), frame.channels()), (6, 4, 1));
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_rgb_file_is_converted_to_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white.jpg");
        image::RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let frame = ImageFileReader::new().read_grayscale(&path).unwrap();
        assert_eq!(frame.channels(), 1);
        assert!(frame.data().iter().all(|&p| p > 250));
    }

    #[test]
    fn test_missing_file_returns_error() {
        assert!(ImageFileReader::new()
            .read_grayscale(Path::new("/nonexistent/face.png"))
            .is_err());
    }

    #[test]
    fn test_non_image_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(ImageFileReader::new().read_grayscale(&path).is_err());
    }
}
