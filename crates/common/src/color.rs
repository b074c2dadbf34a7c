//! Pixel layouts for raw (uncompressed) samples.

use serde::{Deserialize, Serialize};

/// Interleaved pixel layout of a raw sample.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 3 channels, 8 bits each, alpha dropped.
    #[default]
    Rgb24,
    /// 4 channels, 8 bits each, as decoded.
    Rgba32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgb24 => 3,
            Self::Rgba32 => 4,
        }
    }

    /// Bit depth written into the visual sample entry.
    pub fn depth(self) -> u16 {
        (self.bytes_per_pixel() * 8) as u16
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_sizes() {
        assert_eq!(PixelFormat::Rgb24.bytes_per_pixel(), 3);
        assert_eq!(PixelFormat::Rgba32.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::Rgb24.depth(), 0x18);
        assert_eq!(PixelFormat::Rgba32.depth(), 0x20);
    }

    #[test]
    fn pixel_format_alpha() {
        assert!(!PixelFormat::Rgb24.has_alpha());
        assert!(PixelFormat::Rgba32.has_alpha());
    }
}
