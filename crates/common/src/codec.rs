//! Video codec identifiers understood by the muxer.

use serde::{Deserialize, Serialize};

/// Which kind of samples a session carries.
///
/// Selects the sample description written into the track: raw pixel rows,
/// or an H.264 elementary stream with its decoder configuration record.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    /// Uncompressed interleaved pixels, every sample a sync sample.
    #[default]
    Raw,
    /// Length-prefixed H.264 NAL units with keyframe flags.
    H264,
}

impl VideoCodec {
    /// Human-readable name (for logging).
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Raw => "raw RGB",
            Self::H264 => "H.264/AVC",
        }
    }

    pub fn is_compressed(self) -> bool {
        !matches!(self, Self::Raw)
    }
}
