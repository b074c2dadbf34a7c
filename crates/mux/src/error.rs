//! Muxer error types.

use g2v_common::{ConfigError, Resolution};
use thiserror::Error;

use crate::atoms::FourCc;
use crate::muxer::SessionState;

/// Errors that can occur during MP4 muxing.
#[derive(Error, Debug)]
pub enum MuxError {
    /// Memory for a sample copy or the output buffer could not be reserved.
    #[error("Allocation of {requested} bytes failed")]
    AllocationFailure { requested: usize },

    /// An operation was called in a state that does not allow it.
    #[error("Cannot {operation} while session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Finalize was called before any sample was added.
    #[error("Session has no samples to mux")]
    EmptySession,

    /// A compressed track must start with a sync sample.
    #[error("First sample of a compressed track must be a sync sample")]
    MissingKeyframe,

    /// A raw sample's byte length disagrees with the session dimensions.
    #[error("Sample is {actual} bytes, expected {expected} for the session frame size")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An RGBA frame's dimensions differ from the session's.
    #[error("Frame is {actual}, session expects {expected}")]
    FrameSizeMismatch {
        expected: Resolution,
        actual: Resolution,
    },

    /// The configured sample ceiling was reached.
    #[error("Sample limit of {limit} reached")]
    SampleLimit { limit: usize },

    /// A patch targeted bytes that were never written.
    #[error("Patch at offset {offset} is outside the {len} bytes written")]
    PatchOutOfBounds { offset: usize, len: usize },

    /// A box grew past the 32-bit length field.
    #[error("Box '{fourcc}' size {size} exceeds 32-bit limit")]
    BoxTooLarge { fourcc: FourCc, size: u64 },

    /// Invalid muxer configuration.
    #[error("Invalid muxer config: {0}")]
    Config(#[from] ConfigError),

    /// I/O error from a byte writer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MuxError {
    /// Whether this is the expected "nothing was added" outcome rather than a failure.
    pub fn is_empty_session(&self) -> bool {
        matches!(self, Self::EmptySession)
    }
}

/// Convenience Result type for mux operations.
pub type MuxResult<T> = Result<T, MuxError>;
