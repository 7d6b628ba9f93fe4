use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

/// Decodes frames via ffmpeg-next (libavformat + libavdevice + libavcodec).
///
/// Any location libavformat can open works: a V4L2 camera such as
/// `/dev/video0`, a video file, or a network stream. Each decoded frame is
/// converted to RGB24.
pub struct FfmpegFrameSource {
    state: Option<DecodeState>,
}

struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self, location: &str) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(location)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::info!("Opened {location} ({width}x{height})");
        self.state = Some(DecodeState {
            ictx,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            frame_index: 0,
            flushing: false,
            done: false,
        });
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(state) = self.state.as_mut() else {
            return Err("FfmpegFrameSource: not opened".into());
        };
        state.next_frame()
    }

    fn close(&mut self) {
        self.state = None;
    }
}

impl DecodeState {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.done {
            return Ok(None);
        }
        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }
        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            if let PacketRead::EndOfStream = classify_read(packet.read(&mut self.ictx)) {
                return self.flush();
            }

            if packet.stream() != self.video_stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }

    /// Drains frames still buffered in the decoder once input has ended.
    fn flush(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if let Err(e) = self.decoder.send_eof() {
            log::debug!("Decoder flush failed: {e}");
        }
        self.flushing = true;
        let frame = self.try_receive()?;
        if frame.is_none() {
            self.done = true;
        }
        Ok(frame)
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PacketRead {
    Packet,
    EndOfStream,
}

/// Any read failure ends the stream. A camera that disappears reports an
/// I/O error instead of end-of-file, and retrying it never recovers.
fn classify_read(result: Result<(), ffmpeg_next::Error>) -> PacketRead {
    match result {
        Ok(()) => PacketRead::Packet,
        Err(ffmpeg_next::Error::Eof) => PacketRead::EndOfStream,
        Err(e) => {
            log::warn!("Reading from the video source failed, ending stream: {e}");
            PacketRead::EndOfStream
        }
    }
}

/// Copies tightly packed RGB rows out of a possibly padded ffmpeg plane.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
