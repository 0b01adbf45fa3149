//! Streaming video transcoding for dataset preparation.
//!
//! Frames are decoded one at a time, passed through a caller-supplied
//! transform and re-encoded, so memory use does not grow with video length.
//!
//! # Transcoding
//!
//! - [`convert`] / [`convert_with_config`] - Frame-by-frame conversion
//! - [`ConvertStats`] - Frames written and source properties
//! - [`VideoConfig`] / [`FourCc`] - Output codec selection
//!
//! # Backends
//!
//! - [`VideoBackend`], [`VideoSource`], [`VideoSink`] - Media library seam
//! - [`MemoryBackend`] - In-memory streams
//! - `FfmpegBackend` / `convert_file` - Media files (feature `ffmpeg`)
//!
//! # Example
//!
//! ```
//! use ml_video::{Frame, MemoryBackend, VideoProperties, convert};
//!
//! let backend = MemoryBackend::new();
//! backend.insert("clip.avi", VideoProperties::new(640.0, 480.0, 30.0), vec![Frame::black(640, 480); 10]);
//!
//! let stats = convert(&backend, "clip.avi", |frame| Ok::<_, String>(frame), "out.avi").unwrap();
//! assert_eq!(stats.frames_written, 10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod backend;
mod config;
mod convert;
mod error;
#[cfg(feature = "ffmpeg")]
mod ffmpeg;
mod fourcc;
mod frame;
mod memory;
mod properties;

// Re-export transcoding
pub use convert::{ConvertStats, convert, convert_with_config};

// Re-export stream types
pub use config::VideoConfig;
pub use fourcc::FourCc;
pub use frame::{CHANNELS, Frame};
pub use properties::VideoProperties;

// Re-export backends
pub use backend::{SinkSpec, VideoBackend, VideoSink, VideoSource};
pub use memory::{MemoryBackend, MemoryEvent, MemorySink, MemorySource};

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegBackend, FfmpegSink, FfmpegSource, codec_for, convert_file};

// Re-export error types
pub use error::{Result, VideoError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ConvertStats, FourCc, Frame, MemoryBackend, VideoBackend, VideoConfig, VideoError,
        VideoProperties, VideoSink, VideoSource, convert, convert_with_config,
    };
}
