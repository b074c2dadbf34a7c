//! Configuration error types (thiserror-based).

use thiserror::Error;

use crate::types::Resolution;

/// Rejected session settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Resolution {0} must be non-zero and even in both dimensions")]
    UnevenResolution(Resolution),

    #[error("Timescale must be > 0")]
    ZeroTimescale,

    #[error("Sample limit must be > 0")]
    ZeroSampleLimit,

    #[error("Dimension {0} does not fit the 16-bit sample entry field")]
    DimensionTooLarge(u32),
}
