//! Source and sink seams between the transcoder and a media library.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fourcc::FourCc;
use crate::frame::Frame;
use crate::properties::VideoProperties;

/// Decoded frame stream read from an input.
pub trait VideoSource {
    /// Returns the stream properties, fixed once the source is open.
    fn properties(&self) -> VideoProperties;

    /// Reads the next BGR frame, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the next frame cannot be decoded.
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Releases the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the release fails.
    fn release(self) -> Result<()>;
}

/// Encoded frame stream written to an output.
pub trait VideoSink {
    /// Encodes and writes one BGR frame.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::InvalidFrame`](crate::VideoError::InvalidFrame)
    /// if the frame size differs from the sink's, or an encoder error.
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flushes buffered frames and finalizes the output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or finalizing fails.
    fn release(self) -> Result<()>;
}

/// Parameters an output is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SinkSpec {
    /// Output codec.
    pub fourcc: FourCc,

    /// Frames per second.
    pub fps: f64,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,
}

/// Opens sources and sinks of one media library.
pub trait VideoBackend {
    /// Source type.
    type Source: VideoSource;

    /// Sink type.
    type Sink: VideoSink;

    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::SourceUnavailable`](crate::VideoError::SourceUnavailable)
    /// if the input cannot be opened.
    fn open_source(&self, path: &Path) -> Result<Self::Source>;

    /// Creates or truncates `path` for writing.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::SinkUnavailable`](crate::VideoError::SinkUnavailable)
    /// if the output cannot be opened.
    fn open_sink(&self, path: &Path, spec: &SinkSpec) -> Result<Self::Sink>;
}
