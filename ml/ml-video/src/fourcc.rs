//! Four-character codec identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VideoError};

/// A four-character code naming an output codec, such as `XVID`.
///
/// Serialized as its four-letter string.
///
/// # Example
///
/// ```
/// use ml_video::FourCc;
///
/// let code: FourCc = "MJPG".parse().unwrap();
/// assert_eq!(code.to_string(), "MJPG");
/// assert_eq!(FourCc::XVID.as_u32(), u32::from_le_bytes(*b"XVID"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// Xvid MPEG-4 Part 2.
    pub const XVID: Self = Self(*b"XVID");

    /// DivX MPEG-4 Part 2.
    pub const DIVX: Self = Self(*b"DIVX");

    /// Generic MPEG-4 Part 2.
    pub const MP4V: Self = Self(*b"mp4v");

    /// Motion JPEG.
    pub const MJPG: Self = Self(*b"MJPG");

    /// H.264 / AVC.
    pub const H264: Self = Self(*b"H264");

    /// Creates a code from four bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::InvalidFourCc`] unless every byte is printable
    /// ASCII.
    pub fn new(bytes: [u8; 4]) -> Result<Self> {
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            Ok(Self(bytes))
        } else {
            Err(VideoError::InvalidFourCc(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        }
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn bytes(&self) -> [u8; 4] {
        self.0
    }

    /// Returns the code packed little-endian, first character lowest.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// Returns `true` if every byte is printable ASCII.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        Self::new(self.0).is_ok()
    }

    fn as_str(&self) -> &str {
        // Construction guarantees ASCII.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl Default for FourCc {
    fn default() -> Self {
        Self::XVID
    }
}

impl FromStr for FourCc {
    type Err = VideoError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| VideoError::InvalidFourCc(s.to_string()))?;
        Self::new(bytes)
    }
}

impl TryFrom<String> for FourCc {
    type Error = VideoError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<FourCc> for String {
    fn from(code: FourCc) -> Self {
        code.to_string()
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
