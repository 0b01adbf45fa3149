//! Stream properties read from an opened source.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VideoError};

/// Width, height and frame rate of a video stream.
///
/// Dimensions are kept as reported by the backend (floating point); the
/// output frame size is their truncated integer value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoProperties {
    /// Frame width in pixels.
    pub width: f64,

    /// Frame height in pixels.
    pub height: f64,

    /// Frames per second.
    pub fps: f64,

    /// Number of frames, if the container reports it.
    #[serde(default)]
    pub frame_count: Option<u64>,
}

impl VideoProperties {
    /// Creates properties without a frame count.
    #[must_use]
    pub const fn new(width: f64, height: f64, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            frame_count: None,
        }
    }

    /// Sets the frame count.
    #[must_use]
    pub const fn with_frame_count(mut self, frame_count: u64) -> Self {
        self.frame_count = Some(frame_count);
        self
    }

    /// Returns the integer frame size, truncating fractional dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::InvalidProperties`] if a dimension is not a
    /// finite value between 1 and `u32::MAX`.
    pub fn frame_size(&self) -> Result<(u32, u32)> {
        Ok((dimension("width", self.width)?, dimension("height", self.height)?))
    }

    /// Checks that the properties can describe an output stream.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::InvalidProperties`] for a bad size or a frame
    /// rate that is not finite and positive.
    pub fn validate(&self) -> Result<()> {
        self.frame_size()?;
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(VideoError::invalid_properties(format!(
                "frame rate must be positive, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Returns the stream duration in seconds, if the frame count is known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> Option<f64> {
        self.frame_count
            .filter(|_| self.fps > 0.0)
            .map(|n| n as f64 / self.fps)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dimension(name: &str, value: f64) -> Result<u32> {
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated < 1.0 || truncated > f64::from(u32::MAX) {
        return Err(VideoError::invalid_properties(format!(
            "{name} must be at least 1, got {value}"
        )));
    }
    Ok(truncated as u32)
}
