//! Muxer session: the lifecycle around the box writers.
//!
//! Usage:
//! ```ignore
//! let mut session = MuxerSession::open(MuxerConfig::raw(100, 100, 1000), None)?;
//!
//! // Push frames one at a time
//! session.add_sample(&rgb_pixels, 100, true)?;
//! session.add_rgba_frame(&rgba_pixels, 100, 100, 150)?;
//!
//! // Finalize: runs the sample table and header assembly once
//! let mp4_bytes = session.finalize()?;
//! ```

use g2v_common::{MuxerConfig, Resolution};

use crate::atoms::{FourCc, BOX_HEADER_SIZE};
use crate::error::{MuxError, MuxResult};
use crate::frame;
use crate::mp4::{self, TrackInfo};
use crate::sample::Sample;
use crate::sample_entry::SampleEntry;
use crate::stbl::SampleTable;

/// Where a session is in its lifecycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    /// Accepting samples.
    Open,
    /// Output produced; a new `init` is required.
    Finalized,
}

/// One mux operation: settings, sample description and accumulated samples.
///
/// The session owns every sample payload until `finalize` hands the
/// finished file to the caller.
#[derive(Debug, Default)]
pub struct MuxerSession {
    state: SessionState,
    config: MuxerConfig,
    entry: Option<SampleEntry>,
    samples: Vec<Sample>,
    /// Samples accepted since `init`, kept after finalize releases them.
    sample_count: usize,
    /// Total payload bytes accepted since `init`.
    payload_bytes: u64,
}

impl MuxerSession {
    /// An uninitialized session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and `init` it in one step.
    pub fn open(config: MuxerConfig, codec_config: Option<Vec<u8>>) -> MuxResult<Self> {
        let mut session = Self::new();
        session.init(config, codec_config)?;
        Ok(session)
    }

    /// Start a new session, discarding whatever this one held.
    ///
    /// `codec_config` is the decoder configuration record for compressed
    /// tracks; raw tracks ignore it. An invalid config leaves the session
    /// untouched.
    pub fn init(&mut self, config: MuxerConfig, codec_config: Option<Vec<u8>>) -> MuxResult<()> {
        config.validate()?;

        if self.state == SessionState::Open && !self.samples.is_empty() {
            tracing::warn!(
                samples = self.samples.len(),
                "Discarding open session with unfinalized samples"
            );
        }
        self.reset();

        let entry = SampleEntry::for_config(&config, codec_config);
        tracing::info!(
            resolution = %config.resolution,
            timescale = config.timescale,
            codec = config.codec.display_name(),
            "Opened mux session"
        );

        self.entry = Some(entry);
        self.config = config;
        self.state = SessionState::Open;
        Ok(())
    }

    /// Copy one sample into the session.
    ///
    /// Raw tracks require exactly one frame's worth of bytes and every raw
    /// sample is a sync sample regardless of `is_sync`.
    pub fn add_sample(&mut self, payload: &[u8], duration: u32, is_sync: bool) -> MuxResult<()> {
        self.ensure_open("add_sample")?;

        let is_sync = match self.config.raw_sample_size() {
            Some(expected) => {
                if payload.len() != expected {
                    return Err(MuxError::DimensionMismatch {
                        expected,
                        actual: payload.len(),
                    });
                }
                true
            }
            None => is_sync,
        };
        // Decoding has to start somewhere; this also keeps stss non-empty.
        let compressed = self.entry.as_ref().is_some_and(SampleEntry::is_compressed);
        if compressed && self.samples.is_empty() && !is_sync {
            return Err(MuxError::MissingKeyframe);
        }
        self.check_room(payload.len())?;

        let mut owned = Vec::new();
        owned
            .try_reserve_exact(payload.len())
            .map_err(|_| MuxError::AllocationFailure {
                requested: payload.len(),
            })?;
        owned.extend_from_slice(payload);

        self.push(Sample::new(owned, duration, is_sync))
    }

    /// Replace the decoder configuration record of an open compressed session.
    ///
    /// Encoders often hand over the record together with their first
    /// output, after the session has been opened. An empty record reverts
    /// to the fallback.
    pub fn set_codec_config(&mut self, record: Vec<u8>) -> MuxResult<()> {
        self.ensure_open("set_codec_config")?;
        match &mut self.entry {
            Some(SampleEntry::CompressedStream { config }) => {
                tracing::debug!(bytes = record.len(), "Decoder configuration record set");
                *config = Some(record).filter(|record| !record.is_empty());
                Ok(())
            }
            _ => Err(MuxError::InvalidState {
                operation: "set_codec_config on a raw track",
                state: self.state,
            }),
        }
    }

    /// Convert an RGBA frame to the session's raw pixel format and add it.
    ///
    /// A zero `duration` is replaced with the configured default frame
    /// duration.
    pub fn add_rgba_frame(
        &mut self,
        rgba: &[u8],
        width: u32,
        height: u32,
        duration: u32,
    ) -> MuxResult<()> {
        self.ensure_open("add_rgba_frame")?;
        if self.config.codec.is_compressed() {
            return Err(MuxError::InvalidState {
                operation: "add_rgba_frame to a compressed track",
                state: self.state,
            });
        }

        let frame = Resolution::new(width, height);
        if frame != self.config.resolution {
            return Err(MuxError::FrameSizeMismatch {
                expected: self.config.resolution,
                actual: frame,
            });
        }
        let expected = frame.rgba_byte_size();
        if rgba.len() != expected {
            return Err(MuxError::DimensionMismatch {
                expected,
                actual: rgba.len(),
            });
        }

        let duration = if duration == 0 {
            tracing::warn!(
                default = self.config.default_frame_duration,
                "Zero frame duration, using default"
            );
            self.config.default_frame_duration
        } else {
            duration
        };

        let pixels = frame::convert_rgba(rgba, self.config.pixel_format)?;
        self.check_room(pixels.len())?;
        self.push(Sample::new(pixels, duration, true))
    }

    /// Build the file from the accumulated samples.
    ///
    /// With no samples this returns [`MuxError::EmptySession`] and the
    /// session stays open. On success the samples are released and the
    /// returned bytes belong to the caller.
    pub fn finalize(&mut self) -> MuxResult<Vec<u8>> {
        self.ensure_open("finalize")?;
        let entry = match &self.entry {
            Some(entry) => entry,
            None => {
                return Err(MuxError::InvalidState {
                    operation: "finalize",
                    state: self.state,
                })
            }
        };
        if self.samples.is_empty() {
            return Err(MuxError::EmptySession);
        }

        let table = SampleTable::build(&self.samples);
        let track = TrackInfo {
            resolution: self.config.resolution,
            timescale: self.config.timescale,
            entry,
            table: &table,
        };
        let bytes = mp4::assemble(&track, &self.samples, self.config.initial_capacity)?;

        tracing::info!(
            samples = self.sample_count,
            output_bytes = bytes.len(),
            timescale = self.config.timescale,
            duration = table.total_duration(),
            "Mux session finalized"
        );

        self.samples = Vec::new();
        self.state = SessionState::Finalized;
        Ok(bytes)
    }

    /// Drop all samples and return to `Uninitialized`. Valid in any state.
    pub fn reset(&mut self) {
        if self.state != SessionState::Uninitialized {
            tracing::info!(
                state = ?self.state,
                samples = self.sample_count,
                "Mux session reset"
            );
        }
        *self = Self::new();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Samples accepted since the last `init`.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Payload bytes accepted since the last `init`.
    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }

    pub fn config(&self) -> &MuxerConfig {
        &self.config
    }

    fn ensure_open(&self, operation: &'static str) -> MuxResult<()> {
        if self.state == SessionState::Open {
            Ok(())
        } else {
            Err(MuxError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Check the sample ceiling and that `mdat` stays within 32 bits.
    fn check_room(&self, payload_len: usize) -> MuxResult<()> {
        if self.samples.len() >= self.config.max_samples {
            return Err(MuxError::SampleLimit {
                limit: self.config.max_samples,
            });
        }
        let mdat_size = self.payload_bytes + payload_len as u64 + BOX_HEADER_SIZE as u64;
        if mdat_size > u32::MAX as u64 {
            return Err(MuxError::BoxTooLarge {
                fourcc: FourCc(*b"mdat"),
                size: mdat_size,
            });
        }
        Ok(())
    }

    fn push(&mut self, sample: Sample) -> MuxResult<()> {
        self.samples
            .try_reserve(1)
            .map_err(|_| MuxError::AllocationFailure {
                requested: std::mem::size_of::<Sample>(),
            })?;

        tracing::trace!(
            index = self.samples.len(),
            size = sample.payload.len(),
            duration = sample.duration,
            is_sync = sample.is_sync,
            "Added sample"
        );

        self.payload_bytes += sample.payload.len() as u64;
        self.sample_count += 1;
        self.samples.push(sample);
        Ok(())
    }
}
