//! One timed unit of track data.

/// A raw frame or compressed access unit, owned by the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Bytes written verbatim into `mdat`.
    pub payload: Vec<u8>,
    /// Display duration in the session timescale.
    pub duration: u32,
    /// Random-access point. Always true for raw frames.
    pub is_sync: bool,
}

impl Sample {
    pub fn new(payload: Vec<u8>, duration: u32, is_sync: bool) -> Self {
        Self {
            payload,
            duration,
            is_sync,
        }
    }

    /// Payload length as stored in `stsz`.
    ///
    /// The session rejects payloads that would overflow `mdat`, so this
    /// always fits.
    pub fn size(&self) -> u32 {
        self.payload.len() as u32
    }
}
