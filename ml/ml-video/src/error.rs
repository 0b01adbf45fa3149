//! Error types for ml-video crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while transcoding video.
#[derive(Debug, Error)]
pub enum VideoError {
    /// The input could not be opened.
    #[error("cannot open video source {}: {reason}", path.display())]
    SourceUnavailable {
        /// Input path.
        path: PathBuf,
        /// Backend-reported reason.
        reason: String,
    },

    /// The output could not be opened.
    #[error("cannot open video sink {}: {reason}", path.display())]
    SinkUnavailable {
        /// Output path.
        path: PathBuf,
        /// Backend-reported reason.
        reason: String,
    },

    /// Stream properties cannot describe an output.
    #[error("invalid video properties: {0}")]
    InvalidProperties(String),

    /// A frame buffer is malformed or has the wrong size.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// A four-character code is not four printable ASCII characters.
    #[error("invalid four-character code: {0:?}")]
    InvalidFourCc(String),

    /// The caller's frame transform failed.
    #[error("transform failed at frame {frame}: {reason}")]
    Transform {
        /// Index of the failing frame.
        frame: u64,
        /// Reason reported by the transform.
        reason: String,
    },

    /// Decoder, encoder or container error.
    #[error("codec error: {0}")]
    Codec(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VideoError {
    /// Creates a source unavailable error.
    #[must_use]
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a sink unavailable error.
    #[must_use]
    pub fn sink_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SinkUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid properties error.
    #[must_use]
    pub fn invalid_properties(reason: impl Into<String>) -> Self {
        Self::InvalidProperties(reason.into())
    }

    /// Creates an invalid frame error.
    #[must_use]
    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame(reason.into())
    }

    /// Creates a transform error.
    #[must_use]
    pub fn transform(frame: u64, reason: impl Into<String>) -> Self {
        Self::Transform {
            frame,
            reason: reason.into(),
        }
    }

    /// Creates a codec error.
    #[must_use]
    pub fn codec(reason: impl Into<String>) -> Self {
        Self::Codec(reason.into())
    }
}

#[cfg(feature = "ffmpeg")]
impl From<ffmpeg_next::Error> for VideoError {
    fn from(err: ffmpeg_next::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Result type for ml-video operations.
pub type Result<T> = std::result::Result<T, VideoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_source_unavailable() {
        let err = VideoError::source_unavailable("/videos/in.mp4", "no such file");
        assert!(err.to_string().contains("/videos/in.mp4"));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn error_transform() {
        let err = VideoError::transform(12, "bad crop");
        assert!(err.to_string().contains("frame 12"));
        assert!(err.to_string().contains("bad crop"));
    }

    #[test]
    fn error_invalid_fourcc() {
        let err = VideoError::InvalidFourCc("XV".to_string());
        assert!(err.to_string().contains("\"XV\""));
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: VideoError = io_err.into();
        assert!(matches!(err, VideoError::Io(_)));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VideoError>();
    }
}
