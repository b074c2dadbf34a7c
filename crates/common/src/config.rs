//! Session settings for the muxer.

use serde::{Deserialize, Serialize};

use crate::codec::VideoCodec;
use crate::color::PixelFormat;
use crate::error::ConfigError;
use crate::types::Resolution;

/// Default sample ceiling per session.
pub const DEFAULT_MAX_SAMPLES: usize = 100_000;

/// Millisecond timescale, matching GIF frame delays.
pub const DEFAULT_TIMESCALE: u32 = 1000;

/// Settings for one mux session.
///
/// The binary decoder configuration record is not part of this struct; it is
/// handed to the session separately because it comes from the encoder at
/// runtime rather than from user settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxerConfig {
    pub resolution: Resolution,
    /// Units per second for every sample duration in the session.
    pub timescale: u32,
    pub codec: VideoCodec,
    /// Raw-mode sample layout. Ignored for compressed codecs.
    pub pixel_format: PixelFormat,
    /// Hard ceiling on samples per session.
    pub max_samples: usize,
    /// Duration substituted for a zero frame delay, in timescale units.
    pub default_frame_duration: u32,
    /// First reservation for the output buffer, in bytes.
    pub initial_capacity: usize,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            timescale: DEFAULT_TIMESCALE,
            codec: VideoCodec::Raw,
            pixel_format: PixelFormat::Rgb24,
            max_samples: DEFAULT_MAX_SAMPLES,
            default_frame_duration: 100,
            initial_capacity: 64 * 1024,
        }
    }
}

impl MuxerConfig {
    /// Raw-mode settings for the given frame size.
    pub fn raw(width: u32, height: u32, timescale: u32) -> Self {
        Self {
            resolution: Resolution::new(width, height),
            timescale,
            ..Self::default()
        }
    }

    /// H.264 settings for the given frame size.
    pub fn h264(width: u32, height: u32, timescale: u32) -> Self {
        Self {
            resolution: Resolution::new(width, height),
            timescale,
            codec: VideoCodec::H264,
            ..Self::default()
        }
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Byte length of one raw sample, or `None` for compressed codecs.
    pub fn raw_sample_size(&self) -> Option<usize> {
        match self.codec {
            VideoCodec::Raw => Some(
                self.resolution.pixel_count() as usize
                    * self.pixel_format.bytes_per_pixel() as usize,
            ),
            VideoCodec::H264 => None,
        }
    }

    /// Check the settings before a session is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resolution.is_even() {
            return Err(ConfigError::UnevenResolution(self.resolution));
        }
        for dim in [self.resolution.width, self.resolution.height] {
            if dim > u16::MAX as u32 {
                return Err(ConfigError::DimensionTooLarge(dim));
            }
        }
        if self.timescale == 0 {
            return Err(ConfigError::ZeroTimescale);
        }
        if self.max_samples == 0 {
            return Err(ConfigError::ZeroSampleLimit);
        }
        Ok(())
    }
}
