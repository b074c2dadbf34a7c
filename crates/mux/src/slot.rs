//! Process-wide single-session surface.
//!
//! For embeddings that drive the muxer through plain function calls
//! (`init`, `add_sample`, `finalize`, `reset`) instead of holding a
//! [`MuxerSession`]. Exactly one session lives here; calls from different
//! threads are serialized by the mutex.

use g2v_common::MuxerConfig;
use parking_lot::Mutex;

use crate::error::MuxResult;
use crate::muxer::{MuxerSession, SessionState};

static SLOT: Mutex<Option<MuxerSession>> = parking_lot::const_mutex(None);

/// Run `f` against the slot's session, creating it on first use.
///
/// The slot stays locked while `f` runs, so `f` must not call back into any
/// other function of this module; that would deadlock.
pub fn with_session<R>(f: impl FnOnce(&mut MuxerSession) -> R) -> R {
    let mut slot = SLOT.lock();
    f(slot.get_or_insert_with(MuxerSession::new))
}

/// Open the slot's session, discarding any previous one.
pub fn init(config: MuxerConfig, codec_config: Option<Vec<u8>>) -> MuxResult<()> {
    with_session(|session| session.init(config, codec_config))
}

pub fn add_sample(payload: &[u8], duration: u32, is_sync: bool) -> MuxResult<()> {
    with_session(|session| session.add_sample(payload, duration, is_sync))
}

/// Hand the decoder configuration record to the open compressed session.
pub fn set_codec_config(record: Vec<u8>) -> MuxResult<()> {
    with_session(|session| session.set_codec_config(record))
}

pub fn add_rgba_frame(rgba: &[u8], width: u32, height: u32, duration: u32) -> MuxResult<()> {
    with_session(|session| session.add_rgba_frame(rgba, width, height, duration))
}

/// Finalize the slot's session. The returned bytes are owned by the caller.
pub fn finalize() -> MuxResult<Vec<u8>> {
    with_session(MuxerSession::finalize)
}

/// Free the slot's session. Call before teardown or an unrelated session.
pub fn reset() {
    if let Some(session) = SLOT.lock().as_mut() {
        session.reset();
    }
}

pub fn state() -> SessionState {
    SLOT.lock()
        .as_ref()
        .map_or(SessionState::Uninitialized, MuxerSession::state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MuxError;

    // The slot is global, so the whole lifecycle runs in one test.
    #[test]
    fn test_slot_lifecycle() {
        reset();
        assert_eq!(state(), SessionState::Uninitialized);
        assert!(matches!(
            add_sample(&[0; 4], 10, true),
            Err(MuxError::InvalidState { .. })
        ));

        init(MuxerConfig::h264(16, 16, 1000), None).unwrap();
        assert_eq!(state(), SessionState::Open);
        assert!(finalize().unwrap_err().is_empty_session());

        add_sample(&[0, 0, 0, 1, 0x65], 40, true).unwrap();
        set_codec_config(vec![1, 0x42, 0, 0x1E, 0xFF, 0xE0, 0]).unwrap();
        add_sample(&[0, 0, 0, 1, 0x41], 40, false).unwrap();
        assert_eq!(with_session(|s| s.sample_count()), 2);

        let bytes = finalize().unwrap();
        assert_eq!(&bytes[4..8], b"ftyp");
        assert_eq!(state(), SessionState::Finalized);
        assert!(finalize().is_err());

        init(MuxerConfig::raw(2, 2, 1000), None).unwrap();
        add_rgba_frame(&[0; 16], 2, 2, 0).unwrap();
        assert_eq!(with_session(|s| s.payload_bytes()), 12);

        reset();
        assert_eq!(state(), SessionState::Uninitialized);
    }
}
