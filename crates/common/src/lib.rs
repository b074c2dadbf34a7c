//! `g2v-common`: Shared types and settings for the gif2video muxer.
//!
//! The muxer crate and its embedders agree on these definitions:
//!
//! - **Types**: `Resolution` (frame dimensions)
//! - **Color**: `PixelFormat` (raw-mode sample layout)
//! - **Codec**: `VideoCodec` (which sample description the track carries)
//! - **Config**: `MuxerConfig` (serde-serializable session settings)
//! - **Errors**: `ConfigError` (thiserror-based)

pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use codec::VideoCodec;
pub use color::PixelFormat;
pub use config::MuxerConfig;
pub use error::ConfigError;
pub use types::Resolution;
