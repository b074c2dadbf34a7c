//! Core types with newtype pattern for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame resolution in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const QVGA: Self = Self {
        width: 320,
        height: 240,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Both dimensions are non-zero and divisible by two.
    ///
    /// Macroblock-oriented decoders reject odd frame sizes, so the muxer
    /// holds raw tracks to the same rule.
    pub fn is_even(self) -> bool {
        self.width > 0 && self.height > 0 && self.width % 2 == 0 && self.height % 2 == 0
    }

    /// Byte size for RGBA8 pixel data.
    pub fn rgba_byte_size(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::QVGA
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_byte_sizes() {
        let r = Resolution::new(100, 100);
        assert_eq!(r.pixel_count(), 10_000);
        assert_eq!(r.rgba_byte_size(), 40_000);
    }

    #[test]
    fn resolution_even_check() {
        assert!(Resolution::new(320, 240).is_even());
        assert!(!Resolution::new(321, 240).is_even());
        assert!(!Resolution::new(320, 241).is_even());
        assert!(!Resolution::new(0, 240).is_even());
    }

    #[test]
    fn resolution_display() {
        assert_eq!(Resolution::new(640, 480).to_string(), "640x480");
    }
}
