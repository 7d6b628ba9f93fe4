use ndarray::ArrayView3;

use crate::shared::bounding_box::BoundingBox;

/// A single camera frame or face crop: contiguous bytes in row-major order.
///
/// Camera frames are RGB (3 channels); face crops handed to the recognizer
/// and persisted as samples are grayscale (1 channel).
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies out the part of the frame covered by `bbox`, clamped to bounds.
    ///
    /// Returns `None` if the box lies entirely outside the frame.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Frame> {
        let clamped = bbox.clamp_to(self.width, self.height)?;
        let channels = self.channels as usize;
        let stride = self.width as usize * channels;
        let x1 = clamped.x as usize;
        let y1 = clamped.y as usize;
        let w = clamped.width as usize;
        let h = clamped.height as usize;

        let mut data = Vec::with_capacity(w * h * channels);
        for row in y1..y1 + h {
            let start = row * stride + x1 * channels;
            data.extend_from_slice(&self.data[start..start + w * channels]);
        }
        Some(Frame::new(data, w as u32, h as u32, self.channels, self.index))
    }

    /// Converts RGB to single-channel luma (BT.601 weights).
    ///
    /// Frames that are already single-channel are returned as-is.
    pub fn to_grayscale(&self) -> Frame {
        if self.channels == 1 {
            return self.clone();
        }
        let channels = self.channels as usize;
        let data = self
            .data
            .chunks_exact(channels)
            .map(|px| {
                let luma = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
                ((luma + 500) / 1000) as u8
            })
            .collect();
        Frame::new(data, self.width, self.height, 1, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
