//! FFmpeg-backed sources and sinks.
//!
//! Sources decode the best video stream of any container FFmpeg can demux
//! and convert each frame to packed BGR24. Sinks pick an encoder from the
//! four-character code and feed it YUV frames converted from BGR24.
//!
//! | Four-cc                        | Encoder        |
//! |--------------------------------|----------------|
//! | `XVID`, `DIVX`, `DX50`, `mp4v`, `FMP4` | MPEG-4 Part 2  |
//! | `MJPG`                         | Motion JPEG    |
//! | `H264`, `X264`, `avc1`         | H.264          |

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ffmpeg_next as ffmpeg;
use ffmpeg::codec;
use ffmpeg::format::{self, Pixel};
use ffmpeg::media;
use ffmpeg::software::scaling;
use ffmpeg::util::frame::video::Video;
use ffmpeg::{Packet, Rational};
use tracing::debug;

use crate::backend::{SinkSpec, VideoBackend, VideoSink, VideoSource};
use crate::convert::{ConvertStats, convert};
use crate::error::{Result, VideoError};
use crate::fourcc::FourCc;
use crate::frame::{CHANNELS, Frame};
use crate::properties::VideoProperties;

/// Outcome of library initialization, shared by every later call.
static INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

fn init() -> Result<()> {
    INIT.get_or_init(|| ffmpeg::init().map_err(|err| err.to_string()))
        .clone()
        .map_err(VideoError::codec)
}

/// Returns the encoder used for `fourcc`, if any.
#[must_use]
pub fn codec_for(fourcc: FourCc) -> Option<codec::Id> {
    match &fourcc.bytes().map(|b| b.to_ascii_uppercase()) {
        b"XVID" | b"DIVX" | b"DX50" | b"MP4V" | b"FMP4" => Some(codec::Id::MPEG4),
        b"MJPG" => Some(codec::Id::MJPEG),
        b"H264" | b"X264" | b"AVC1" => Some(codec::Id::H264),
        _ => None,
    }
}

/// Video backend over the FFmpeg libraries.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    /// Creates the backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl VideoBackend for FfmpegBackend {
    type Source = FfmpegSource;
    type Sink = FfmpegSink;

    fn open_source(&self, path: &Path) -> Result<FfmpegSource> {
        init()?;
        FfmpegSource::open(path).map_err(|err| match err {
            VideoError::Codec(reason) => VideoError::source_unavailable(path, reason),
            other => other,
        })
    }

    fn open_sink(&self, path: &Path, spec: &SinkSpec) -> Result<FfmpegSink> {
        init()?;
        FfmpegSink::open(path, spec).map_err(|err| match err {
            VideoError::Codec(reason) => VideoError::sink_unavailable(path, reason),
            other => other,
        })
    }
}

/// Decoding reader over a media file.
pub struct FfmpegSource {
    path: PathBuf,
    input: format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::decoder::Video,
    scaler: scaling::Context,
    properties: VideoProperties,
    eof_sent: bool,
}

impl FfmpegSource {
    fn open(path: &Path) -> Result<Self> {
        let input = format::input(&path)?;
        let stream = input
            .streams()
            .best(media::Type::Video)
            .ok_or_else(|| VideoError::codec("no video stream"))?;
        let stream_index = stream.index();

        let context = codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = context.decoder().video()?;

        let mut rate = stream.avg_frame_rate();
        if rate.denominator() == 0 || rate.numerator() == 0 {
            rate = stream.rate();
        }
        let mut properties = VideoProperties::new(
            f64::from(decoder.width()),
            f64::from(decoder.height()),
            f64::from(rate),
        );
        if let Ok(count) = u64::try_from(stream.frames()) {
            if count > 0 {
                properties = properties.with_frame_count(count);
            }
        }

        let scaler = scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::BGR24,
            decoder.width(),
            decoder.height(),
            scaling::Flags::BILINEAR,
        )?;

        debug!(
            path = %path.display(),
            codec = ?decoder.id(),
            width = decoder.width(),
            height = decoder.height(),
            fps = properties.fps,
            "opened video source"
        );

        Ok(Self {
            path: path.to_path_buf(),
            input,
            stream_index,
            decoder,
            scaler,
            properties,
            eof_sent: false,
        })
    }

    /// Sends the next packet of the video stream, or end of stream.
    fn feed(&mut self) -> Result<()> {
        for (stream, packet) in self.input.packets() {
            if stream.index() == self.stream_index {
                self.decoder.send_packet(&packet)?;
                return Ok(());
            }
        }
        self.decoder.send_eof()?;
        self.eof_sent = true;
        Ok(())
    }

    fn to_frame(&mut self, decoded: &Video) -> Result<Frame> {
        let mut bgr = Video::empty();
        self.scaler.run(decoded, &mut bgr)?;

        let (width, height) = (bgr.width(), bgr.height());
        let row = width as usize * CHANNELS;
        let stride = bgr.stride(0);
        let plane = bgr.data(0);

        let mut data = Vec::with_capacity(row * height as usize);
        for y in 0..height as usize {
            let start = y * stride;
            let line = plane
                .get(start..start + row)
                .ok_or_else(|| VideoError::invalid_frame("BGR plane shorter than frame"))?;
            data.extend_from_slice(line);
        }
        Frame::new(width, height, data)
    }
}

impl VideoSource for FfmpegSource {
    fn properties(&self) -> VideoProperties {
        self.properties
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut decoded = Video::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => return self.to_frame(&decoded).map(Some),
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {
                    if self.eof_sent {
                        return Ok(None);
                    }
                    self.feed()?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn release(self) -> Result<()> {
        debug!(path = %self.path.display(), "released video source");
        Ok(())
    }
}

/// Encoding writer into a media file.
pub struct FfmpegSink {
    path: PathBuf,
    output: format::context::Output,
    encoder: ffmpeg::encoder::video::Encoder,
    scaler: scaling::Context,
    stream_index: usize,
    encoder_time_base: Rational,
    spec: SinkSpec,
    next_pts: i64,
}

impl FfmpegSink {
    fn open(path: &Path, spec: &SinkSpec) -> Result<Self> {
        let codec_id = codec_for(spec.fourcc)
            .ok_or_else(|| VideoError::codec(format!("no encoder for four-cc {}", spec.fourcc)))?;
        let codec = ffmpeg::encoder::find(codec_id)
            .ok_or_else(|| VideoError::codec(format!("encoder {codec_id:?} not available")))?;

        let mut output = format::output(&path)?;
        let global_header = output
            .format()
            .flags()
            .contains(format::Flags::GLOBAL_HEADER);

        let pixel = if codec_id == codec::Id::MJPEG {
            Pixel::YUVJ420P
        } else {
            Pixel::YUV420P
        };
        let frame_rate = Rational::from(spec.fps);
        let time_base = frame_rate.invert();

        let mut encoder = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder.set_width(spec.width);
        encoder.set_height(spec.height);
        encoder.set_format(pixel);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(frame_rate));
        if global_header {
            encoder.set_flags(codec::Flags::GLOBAL_HEADER);
        }
        let encoder = encoder.open_as(codec)?;

        let stream_index = {
            let mut stream = output.add_stream(codec)?;
            stream.set_parameters(&encoder);
            stream.set_time_base(time_base);
            stream.index()
        };
        output.write_header()?;

        let scaler = scaling::Context::get(
            Pixel::BGR24,
            spec.width,
            spec.height,
            pixel,
            spec.width,
            spec.height,
            scaling::Flags::BILINEAR,
        )?;

        debug!(
            path = %path.display(),
            codec = ?codec_id,
            fourcc = %spec.fourcc,
            width = spec.width,
            height = spec.height,
            fps = spec.fps,
            "opened video sink"
        );

        Ok(Self {
            path: path.to_path_buf(),
            output,
            encoder,
            scaler,
            stream_index,
            encoder_time_base: time_base,
            spec: *spec,
            next_pts: 0,
        })
    }

    /// Writes every packet the encoder has ready.
    fn drain(&mut self) -> Result<()> {
        let stream_time_base = self
            .output
            .stream(self.stream_index)
            .map_or(self.encoder_time_base, |s| s.time_base());
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, stream_time_base);
            packet.write_interleaved(&mut self.output)?;
        }
        Ok(())
    }
}

impl VideoSink for FfmpegSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.size() != (self.spec.width, self.spec.height) {
            return Err(VideoError::invalid_frame(format!(
                "expected {}x{}, got {}x{}",
                self.spec.width,
                self.spec.height,
                frame.width(),
                frame.height()
            )));
        }

        let mut bgr = Video::new(Pixel::BGR24, frame.width(), frame.height());
        let row = frame.row_len();
        let stride = bgr.stride(0);
        let plane = bgr.data_mut(0);
        for (y, line) in frame.data().chunks_exact(row.max(1)).enumerate() {
            plane[y * stride..y * stride + row].copy_from_slice(line);
        }

        let mut yuv = Video::empty();
        self.scaler.run(&bgr, &mut yuv)?;
        yuv.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder.send_frame(&yuv)?;
        self.drain()
    }

    fn release(mut self) -> Result<()> {
        self.encoder.send_eof()?;
        self.drain()?;
        self.output.write_trailer()?;
        debug!(path = %self.path.display(), frames = self.next_pts, "released video sink");
        Ok(())
    }
}

/// Transcodes a media file with the FFmpeg backend.
///
/// See [`convert`] for the conversion rules.
///
/// # Errors
///
/// Returns everything [`convert`] can return.
pub fn convert_file<F, E>(
    input: impl AsRef<Path>,
    transform: F,
    output: impl AsRef<Path>,
) -> Result<ConvertStats>
where
    F: FnMut(Frame) -> std::result::Result<Frame, E>,
    E: std::fmt::Display,
{
    convert(&FfmpegBackend::new(), input, transform, output)
}
