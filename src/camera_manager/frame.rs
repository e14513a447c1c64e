use std::sync::Arc;

/// Pixel layout of a [`Frame`] buffer, 8 bits per channel, tightly packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Gray8,
}

impl PixelFormat {
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Gray8 => 1,
        }
    }
}

/// Immutable snapshot of one camera frame.
///
/// Owned by the tick that captured it; the pixel buffer is shared so handing
/// the frame around never copies pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: u128,
    pub format: PixelFormat,
    pub bytes: Arc<Vec<u8>>,
}

impl Frame {
    /// Number of bytes a fully populated frame of this geometry holds.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.channels()
    }

    /// Non-zero geometry and a buffer large enough for it.
    #[must_use]
    pub fn has_enough_data(&self) -> bool {
        self.width > 0 && self.height > 0 && self.bytes.len() >= self.expected_len()
    }
}
