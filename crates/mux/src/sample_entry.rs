//! The one sample description (`stsd` entry) a track carries.
//!
//! Raw tracks use the uncompressed `raw ` entry with no configuration box.
//! H.264 tracks use `avc1` with a nested `avcC`; the decoder configuration
//! record from the encoder is copied verbatim when it is available.

use g2v_common::{MuxerConfig, PixelFormat, Resolution, VideoCodec};

use crate::atoms::{begin_box, begin_full_box, end_box};
use crate::buffer::ByteBuffer;
use crate::error::MuxResult;

/// Minimal AVCDecoderConfigurationRecord used when the encoder gave none.
///
/// Version 1, Baseline profile, level 3.0, 4-byte NAL lengths, zero SPS and
/// zero PPS. Strict decoders may refuse a stream described this way.
pub const FALLBACK_AVCC: [u8; 7] = [0x01, 0x42, 0x00, 0x1E, 0xFF, 0xE0, 0x00];

/// 72 dpi in 16.16 fixed point.
const RESOLUTION_72_DPI: u32 = 0x0048_0000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleEntry {
    /// Uncompressed interleaved pixels.
    RawPixels(PixelFormat),
    /// H.264 access units with an optional decoder configuration record.
    CompressedStream { config: Option<Vec<u8>> },
}

impl SampleEntry {
    /// Pick the entry for a session. The configuration record only applies
    /// to compressed tracks; an empty record counts as absent.
    pub fn for_config(config: &MuxerConfig, codec_config: Option<Vec<u8>>) -> Self {
        let codec_config = codec_config.filter(|record| !record.is_empty());
        match config.codec {
            VideoCodec::Raw => {
                if codec_config.is_some() {
                    tracing::debug!("Ignoring decoder configuration record for raw track");
                }
                SampleEntry::RawPixels(config.pixel_format)
            }
            VideoCodec::H264 => SampleEntry::CompressedStream {
                config: codec_config,
            },
        }
    }

    pub fn fourcc(&self) -> &'static [u8; 4] {
        match self {
            SampleEntry::RawPixels(_) => b"raw ",
            SampleEntry::CompressedStream { .. } => b"avc1",
        }
    }

    /// Extra `ftyp` compatible brand for this codec.
    pub fn compatible_brand(&self) -> Option<&'static [u8; 4]> {
        match self {
            SampleEntry::RawPixels(_) => None,
            SampleEntry::CompressedStream { .. } => Some(b"avc1"),
        }
    }

    /// Bits per pixel reported in the visual sample entry.
    pub fn depth(&self) -> u16 {
        match self {
            SampleEntry::RawPixels(format) => format.depth(),
            SampleEntry::CompressedStream { .. } => 0x0018,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, SampleEntry::CompressedStream { .. })
    }

    /// Write the stsd box with this as its single entry.
    pub fn write_stsd(&self, buf: &mut ByteBuffer, resolution: Resolution) -> MuxResult<()> {
        let stsd = begin_full_box(buf, b"stsd", 0, 0)?;
        buf.append_u32(1)?; // entry_count

        let entry = begin_box(buf, self.fourcc())?;
        // SampleEntry
        buf.append_zeros(6)?; // reserved
        buf.append_u16(1)?; // data_reference_index
        // VisualSampleEntry
        buf.append_u16(0)?; // pre_defined
        buf.append_u16(0)?; // reserved
        buf.append_zeros(12)?; // pre_defined (3 x u32)
        buf.append_u16(resolution.width as u16)?;
        buf.append_u16(resolution.height as u16)?;
        buf.append_u32(RESOLUTION_72_DPI)?; // horizresolution
        buf.append_u32(RESOLUTION_72_DPI)?; // vertresolution
        buf.append_u32(0)?; // reserved
        buf.append_u16(1)?; // frame_count
        buf.append_zeros(32)?; // compressorname
        buf.append_u16(self.depth())?;
        buf.append_i16(-1)?; // pre_defined

        if let SampleEntry::CompressedStream { config } = self {
            write_avcc(buf, config.as_deref())?;
        }

        end_box(buf, entry)?;
        end_box(buf, stsd)
    }
}

fn write_avcc(buf: &mut ByteBuffer, record: Option<&[u8]>) -> MuxResult<()> {
    let record = match record {
        Some(record) => record,
        None => {
            tracing::warn!(
                "No decoder configuration record supplied, writing fallback avcC; \
                 strict decoders may reject this stream"
            );
            &FALLBACK_AVCC[..]
        }
    };

    let start = begin_box(buf, b"avcC")?;
    buf.append_bytes(record)?;
    end_box(buf, start)
}
