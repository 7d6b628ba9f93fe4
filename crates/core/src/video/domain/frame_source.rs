use crate::shared::frame::Frame;

/// Delivers frames from a camera, file or stream, one at a time.
pub trait FrameSource: Send {
    /// Opens the source. `location` is a device path, file path or URL.
    fn open(&mut self, location: &str) -> Result<(), Box<dyn std::error::Error>>;

    /// Blocks until the next frame is available.
    ///
    /// `Ok(None)` means the source has no more frames.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the device or file. Safe to call more than once.
    fn close(&mut self);
}

/// Scoped hold on an opened [`FrameSource`]; closes it when dropped.
pub struct SourceGuard<'a> {
    source: &'a mut dyn FrameSource,
}

impl<'a> SourceGuard<'a> {
    pub fn new(source: &'a mut dyn FrameSource) -> Self {
        Self { source }
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        self.source.next_frame()
    }
}

impl Drop for SourceGuard<'_> {
    fn drop(&mut self) {
        self.source.close();
        log::debug!("Frame source released");
    }
}
