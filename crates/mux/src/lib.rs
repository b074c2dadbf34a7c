//! `g2v-mux`: MP4 container muxer for animation frames.
//!
//! This crate turns a sequence of raw RGB(A) frames or H.264 access units
//! into a single-track MP4 file (ISO Base Media File Format / ISO 14496-12),
//! entirely in memory.
//!
//! # Architecture
//!
//! - **No FFmpeg dependency**: pure Rust MP4 box writing
//! - **Header first**: `ftyp`, `moov`, `mdat`, so players can start without seeking
//! - **Two-pass chunk offset**: `moov` is built in a scratch buffer, measured,
//!   then its single `stco` entry is patched before anything is committed
//! - **Two sample descriptions**: uncompressed `raw ` or H.264 `avc1` + `avcC`
//! - **Single chunk**: all samples are contiguous in `mdat`
//!
//! # Usage
//!
//! ```ignore
//! use g2v_mux::{MuxerSession, MuxerConfig};
//!
//! let mut session = MuxerSession::open(MuxerConfig::h264(640, 480, 90_000), Some(avcc))?;
//!
//! for (nal, is_keyframe) in access_units {
//!     session.add_sample(&nal, 3000, is_keyframe)?;
//! }
//!
//! let mp4_bytes = session.finalize()?;
//! ```
//!
//! Embeddings that want a single global session can use the [`slot`] functions.

pub mod atoms;
pub mod buffer;
pub mod error;
pub mod frame;
pub mod mp4;
pub mod muxer;
pub mod sample;
pub mod sample_entry;
pub mod slot;
pub mod stbl;

pub use buffer::ByteBuffer;
pub use error::{MuxError, MuxResult};
pub use g2v_common::{MuxerConfig, PixelFormat, Resolution, VideoCodec};
pub use muxer::{MuxerSession, SessionState};
pub use sample::Sample;
pub use sample_entry::{SampleEntry, FALLBACK_AVCC};
pub use stbl::{SampleSizes, SampleTable, TimeToSampleEntry};
