//! MP4 box writers for ISO Base Media File Format (ISO 14496-12).
//!
//! This module writes the structural boxes of a single-track movie:
//! ftyp, moov (mvhd, trak, tkhd, mdia, mdhd, hdlr, minf, stbl, ...) and mdat.
//!
//! Files are laid out header first (`ftyp`, `moov`, `mdat`). The `stco`
//! entry must point into `mdat`, whose position depends on the size of
//! `moov`, so [`assemble`] builds `moov` in a scratch buffer, measures it,
//! resolves the chunk offset, and only then commits bytes in order.

use g2v_common::Resolution;

use crate::atoms::{
    begin_box, begin_full_box, end_box, write_fixed_point_16_16, write_fixed_point_8_8,
    write_unity_matrix, encode_language, BOX_HEADER_SIZE,
};
use crate::buffer::ByteBuffer;
use crate::error::{MuxError, MuxResult};
use crate::sample::Sample;
use crate::sample_entry::SampleEntry;
use crate::stbl::{PendingChunkOffset, SampleTable};

/// The only track in the movie.
pub const TRACK_ID: u32 = 1;

/// Handler name stored in hdlr (null-terminated).
const HANDLER_NAME: &[u8] = b"VideoHandler\0";

/// tkhd flags: enabled | in movie | in preview.
const TRACK_FLAGS: u32 = 0x000007;

/// Everything the header tree needs to know about the track.
#[derive(Clone, Debug)]
pub struct TrackInfo<'a> {
    pub resolution: Resolution,
    /// Media and movie timescale.
    pub timescale: u32,
    pub entry: &'a SampleEntry,
    pub table: &'a SampleTable,
}

impl TrackInfo<'_> {
    pub fn duration(&self) -> u64 {
        self.table.total_duration()
    }
}

/// Header versions switch to 64-bit time fields when the duration needs it.
fn header_version(duration: u64) -> u8 {
    if duration > u32::MAX as u64 {
        1
    } else {
        0
    }
}

/// Append creation/modification times (always zero) for the given version.
fn write_times(buf: &mut ByteBuffer, version: u8) -> MuxResult<()> {
    if version == 1 {
        buf.append_u64(0)?;
        buf.append_u64(0)
    } else {
        buf.append_u32(0)?;
        buf.append_u32(0)
    }
}

fn write_duration(buf: &mut ByteBuffer, version: u8, duration: u64) -> MuxResult<()> {
    if version == 1 {
        buf.append_u64(duration)
    } else {
        buf.append_u32(duration as u32)
    }
}

/// Write the ftyp (File Type) box.
///
/// Compatible brands: isom, iso2, the codec brand if any, mp41
pub fn write_ftyp(buf: &mut ByteBuffer, codec_brand: Option<&[u8; 4]>) -> MuxResult<()> {
    let start = begin_box(buf, b"ftyp")?;
    buf.append_bytes(b"isom")?; // major brand
    buf.append_u32(0x200)?; // minor version
    buf.append_bytes(b"isom")?;
    buf.append_bytes(b"iso2")?;
    if let Some(brand) = codec_brand {
        buf.append_bytes(brand)?;
    }
    buf.append_bytes(b"mp41")?;
    end_box(buf, start)
}

/// Write the mvhd (Movie Header) box.
pub fn write_mvhd(buf: &mut ByteBuffer, timescale: u32, duration: u64) -> MuxResult<()> {
    let version = header_version(duration);
    let start = begin_full_box(buf, b"mvhd", version, 0)?;

    write_times(buf, version)?;
    buf.append_u32(timescale)?;
    write_duration(buf, version, duration)?;

    write_fixed_point_16_16(buf, 1.0)?; // rate
    write_fixed_point_8_8(buf, 1.0)?; // volume
    buf.append_zeros(10)?; // reserved
    write_unity_matrix(buf)?;
    buf.append_zeros(24)?; // pre_defined (6 x u32)
    buf.append_u32(TRACK_ID + 1)?; // next_track_ID

    end_box(buf, start)
}

/// Write the tkhd (Track Header) box.
pub fn write_tkhd(buf: &mut ByteBuffer, duration: u64, resolution: Resolution) -> MuxResult<()> {
    let version = header_version(duration);
    let start = begin_full_box(buf, b"tkhd", version, TRACK_FLAGS)?;

    write_times(buf, version)?;
    buf.append_u32(TRACK_ID)?;
    buf.append_u32(0)?; // reserved
    write_duration(buf, version, duration)?;

    buf.append_zeros(8)?; // reserved (2 x u32)
    buf.append_i16(0)?; // layer
    buf.append_i16(0)?; // alternate_group
    write_fixed_point_8_8(buf, 0.0)?; // volume (video)
    buf.append_u16(0)?; // reserved
    write_unity_matrix(buf)?;

    // Width and height in 16.16 fixed point
    write_fixed_point_16_16(buf, resolution.width as f64)?;
    write_fixed_point_16_16(buf, resolution.height as f64)?;

    end_box(buf, start)
}

/// Write the mdhd (Media Header) box.
pub fn write_mdhd(buf: &mut ByteBuffer, timescale: u32, duration: u64) -> MuxResult<()> {
    let version = header_version(duration);
    let start = begin_full_box(buf, b"mdhd", version, 0)?;

    write_times(buf, version)?;
    buf.append_u32(timescale)?;
    write_duration(buf, version, duration)?;
    buf.append_u16(encode_language("und"))?;
    buf.append_u16(0)?; // pre_defined

    end_box(buf, start)
}

/// Write the hdlr (Handler Reference) box for a video track.
pub fn write_hdlr(buf: &mut ByteBuffer) -> MuxResult<()> {
    let start = begin_full_box(buf, b"hdlr", 0, 0)?;
    buf.append_u32(0)?; // pre_defined
    buf.append_bytes(b"vide")?; // handler_type
    buf.append_zeros(12)?; // reserved (3 x u32)
    buf.append_bytes(HANDLER_NAME)?;
    end_box(buf, start)
}

fn write_vmhd(buf: &mut ByteBuffer) -> MuxResult<()> {
    let start = begin_full_box(buf, b"vmhd", 0, 0x000001)?;
    buf.append_u16(0)?; // graphicsmode
    buf.append_zeros(6)?; // opcolor (3 x u16)
    end_box(buf, start)
}

fn write_dinf(buf: &mut ByteBuffer) -> MuxResult<()> {
    let dinf = begin_box(buf, b"dinf")?;

    let dref = begin_full_box(buf, b"dref", 0, 0)?;
    buf.append_u32(1)?; // entry_count
    // flag 1 = media data is in this file
    let url = begin_full_box(buf, b"url ", 0, 0x000001)?;
    end_box(buf, url)?;
    end_box(buf, dref)?;

    end_box(buf, dinf)
}

fn write_stbl(buf: &mut ByteBuffer, track: &TrackInfo<'_>) -> MuxResult<PendingChunkOffset> {
    let start = begin_box(buf, b"stbl")?;
    track.entry.write_stsd(buf, track.resolution)?;
    let pending = track.table.write(buf)?;
    end_box(buf, start)?;
    Ok(pending)
}

fn write_minf(buf: &mut ByteBuffer, track: &TrackInfo<'_>) -> MuxResult<PendingChunkOffset> {
    let start = begin_box(buf, b"minf")?;
    write_vmhd(buf)?;
    write_dinf(buf)?;
    let pending = write_stbl(buf, track)?;
    end_box(buf, start)?;
    Ok(pending)
}

fn write_mdia(buf: &mut ByteBuffer, track: &TrackInfo<'_>) -> MuxResult<PendingChunkOffset> {
    let start = begin_box(buf, b"mdia")?;
    write_mdhd(buf, track.timescale, track.duration())?;
    write_hdlr(buf)?;
    let pending = write_minf(buf, track)?;
    end_box(buf, start)?;
    Ok(pending)
}

fn write_trak(buf: &mut ByteBuffer, track: &TrackInfo<'_>) -> MuxResult<PendingChunkOffset> {
    let start = begin_box(buf, b"trak")?;
    write_tkhd(buf, track.duration(), track.resolution)?;
    let pending = write_mdia(buf, track)?;
    end_box(buf, start)?;
    Ok(pending)
}

/// Write the complete moov (Movie) box.
///
/// The returned slot still holds a zero chunk offset.
pub fn write_moov(buf: &mut ByteBuffer, track: &TrackInfo<'_>) -> MuxResult<PendingChunkOffset> {
    let start = begin_box(buf, b"moov")?;
    write_mvhd(buf, track.timescale, track.duration())?;
    let pending = write_trak(buf, track)?;
    end_box(buf, start)?;
    Ok(pending)
}

/// Build the finished file: ftyp, moov, mdat.
pub fn assemble(
    track: &TrackInfo<'_>,
    samples: &[Sample],
    initial_capacity: usize,
) -> MuxResult<Vec<u8>> {
    if samples.is_empty() {
        return Err(MuxError::EmptySession);
    }

    let mut out = ByteBuffer::with_capacity(initial_capacity)?;
    write_ftyp(&mut out, track.entry.compatible_brand())?;

    // First pass: header tree against a placeholder chunk offset.
    let mut header = ByteBuffer::new();
    let pending = write_moov(&mut header, track)?;

    // Second pass: the data offset is now fully determined.
    let data_offset = (out.len() + header.len() + BOX_HEADER_SIZE) as u64;
    pending.resolve(&mut header, data_offset)?;
    tracing::debug!(
        ftyp_bytes = out.len(),
        moov_bytes = header.len(),
        data_offset,
        "Resolved chunk offset"
    );

    let payload_bytes: usize = samples.iter().map(|s| s.payload.len()).sum();
    out.ensure(header.len() + BOX_HEADER_SIZE + payload_bytes)?;
    out.append_bytes(header.as_slice())?;

    let mdat = begin_box(&mut out, b"mdat")?;
    for sample in samples {
        out.append_bytes(&sample.payload)?;
    }
    end_box(&mut out, mdat)?;

    Ok(out.into_vec())
}
