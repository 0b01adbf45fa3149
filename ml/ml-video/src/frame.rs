//! Decoded video frames.

use crate::error::{Result, VideoError};

/// Bytes per BGR8 pixel.
pub const CHANNELS: usize = 3;

/// A decoded frame: packed 8-bit BGR pixels, row-major, no row padding.
///
/// # Example
///
/// ```
/// use ml_video::Frame;
///
/// let mut frame = Frame::filled(4, 2, [255, 0, 0]);
/// frame.set_pixel(1, 1, [0, 0, 255]);
/// assert_eq!(frame.pixel(0, 0), Some([255, 0, 0]));
/// assert_eq!(frame.pixel(1, 1), Some([0, 0, 255]));
/// assert_eq!(frame.data().len(), 4 * 2 * 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wraps a BGR8 buffer.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::InvalidFrame`] if `data` does not hold exactly
    /// `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(VideoError::invalid_frame(format!(
                "{width}x{height} BGR frame needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a black frame.
    #[must_use]
    pub fn black(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0])
    }

    /// Creates a frame with every pixel set to `bgr`.
    #[must_use]
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let pixels = byte_len(width, height) / CHANNELS;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&bgr);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Returns the width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the bytes of one row.
    #[must_use]
    pub const fn row_len(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Returns the raw BGR bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the raw BGR bytes for in-place edits.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the frame, returning its buffer.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns row `y`, or `None` past the bottom edge.
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.row_len();
        self.data.get(start..start + self.row_len())
    }

    /// Returns the BGR value at `(x, y)`, or `None` outside the frame.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let offset = self.offset(x, y)?;
        let px = self.data.get(offset..offset + CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }

    /// Sets the BGR value at `(x, y)`; ignored outside the frame.
    pub fn set_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
        if let Some(offset) = self.offset(x, y) {
            self.data[offset..offset + CHANNELS].copy_from_slice(&bgr);
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * CHANNELS)
    }

    /// Returns a copy with blue and red swapped (BGR to RGB or back).
    #[must_use]
    pub fn swap_red_blue(&self) -> Self {
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(CHANNELS) {
            px.swap(0, 2);
        }
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

const fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}
