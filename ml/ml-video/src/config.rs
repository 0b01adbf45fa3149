//! Transcoding configuration.

use serde::{Deserialize, Serialize};

use crate::fourcc::FourCc;

/// Output settings for [`convert_with_config`](crate::convert_with_config).
///
/// Frame rate and frame size always follow the source; only the codec is
/// configurable.
///
/// # Example
///
/// ```
/// use ml_video::{FourCc, VideoConfig};
///
/// let config = VideoConfig::default().with_fourcc(FourCc::MJPG);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Output codec.
    pub fourcc: FourCc,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fourcc: FourCc::XVID,
        }
    }
}

impl VideoConfig {
    /// Sets the output codec.
    #[must_use]
    pub const fn with_fourcc(mut self, fourcc: FourCc) -> Self {
        self.fourcc = fourcc;
        self
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.fourcc.is_valid()
    }
}
