//! Low-level MP4 atom/box writing primitives.
//!
//! MP4 files are structured as nested boxes (atoms). Each box has:
//! - 4-byte big-endian size (includes header)
//! - 4-byte ASCII type (e.g. "ftyp", "moov", "mdat")
//!
//! "Full boxes" additionally have:
//! - 1-byte version
//! - 3-byte flags
//!
//! A box is opened with [`begin_box`], which writes a zero size placeholder,
//! and closed with [`end_box`], which patches the placeholder with the
//! number of bytes written since. Children are written between the two
//! calls, so nesting falls out of call order.

use std::fmt;

use crate::buffer::ByteBuffer;
use crate::error::{MuxError, MuxResult};

/// Size of a standard box header (size + type).
pub const BOX_HEADER_SIZE: usize = 8;

/// Size of a full box header (size + type + version + flags).
pub const FULL_BOX_HEADER_SIZE: usize = 12;

/// ISO 639-2/T "und" (undetermined) packed into 3x5 bits.
pub const LANGUAGE_UND: u16 = 0x55C4;

/// Four-character box or brand code.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({self})")
    }
}

/// An open box whose size field still holds the placeholder.
///
/// Must be passed to [`end_box`] exactly once.
#[must_use = "an open box must be closed with end_box"]
#[derive(Debug)]
pub struct BoxStart {
    offset: usize,
    fourcc: FourCc,
}

impl BoxStart {
    /// Offset of the size field within the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn fourcc(&self) -> FourCc {
        self.fourcc
    }
}

/// Write a size placeholder and the box type; return the open box.
pub fn begin_box(buf: &mut ByteBuffer, box_type: &[u8; 4]) -> MuxResult<BoxStart> {
    let offset = buf.len();
    buf.append_u32(0)?; // placeholder
    buf.append_bytes(box_type)?;
    Ok(BoxStart {
        offset,
        fourcc: FourCc(*box_type),
    })
}

/// Open a "full box": header followed by 1-byte version and 3-byte flags.
pub fn begin_full_box(
    buf: &mut ByteBuffer,
    box_type: &[u8; 4],
    version: u8,
    flags: u32,
) -> MuxResult<BoxStart> {
    let start = begin_box(buf, box_type)?;
    let version_flags = ((version as u32) << 24) | (flags & 0x00FF_FFFF);
    buf.append_u32(version_flags)?;
    Ok(start)
}

/// Patch the box size with the number of bytes from its size field to the
/// current end of the buffer.
pub fn end_box(buf: &mut ByteBuffer, start: BoxStart) -> MuxResult<()> {
    let size = (buf.len() - start.offset) as u64;

    // Standard box size is u32; nothing this muxer writes needs largesize.
    if size > u32::MAX as u64 {
        return Err(MuxError::BoxTooLarge {
            fourcc: start.fourcc,
            size,
        });
    }

    buf.patch_u32(start.offset, size as u32)
}

/// Write a fixed-point 16.16 number.
pub fn write_fixed_point_16_16(buf: &mut ByteBuffer, value: f64) -> MuxResult<()> {
    let fixed = (value * 65536.0).round() as i64 as u32;
    buf.append_u32(fixed)
}

/// Write a fixed-point 8.8 number.
pub fn write_fixed_point_8_8(buf: &mut ByteBuffer, value: f64) -> MuxResult<()> {
    let fixed = (value * 256.0).round() as i16;
    buf.append_i16(fixed)
}

/// Write the identity transformation matrix used by mvhd and tkhd.
///
/// Nine 32-bit values; u, v and w columns are 2.30 fixed point, so the
/// bottom-right cell is `0x40000000` rather than `0x00010000`.
pub fn write_unity_matrix(buf: &mut ByteBuffer) -> MuxResult<()> {
    const MATRIX: [u32; 9] = [
        0x0001_0000, 0, 0, //
        0, 0x0001_0000, 0, //
        0, 0, 0x4000_0000,
    ];
    for value in MATRIX {
        buf.append_u32(value)?;
    }
    Ok(())
}

/// ISO 639-2/T language code packed into 3x5 bits.
/// Falls back to "und" (undetermined) for anything that is not three lowercase letters.
pub fn encode_language(lang: &str) -> u16 {
    let bytes = lang.as_bytes();
    if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_lowercase) {
        return LANGUAGE_UND;
    }
    let a = (bytes[0] - 0x60) as u16;
    let b = (bytes[1] - 0x60) as u16;
    let c = (bytes[2] - 0x60) as u16;
    (a << 10) | (b << 5) | c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_box_writes_placeholder() {
        let mut buf = ByteBuffer::new();
        let start = begin_box(&mut buf, b"ftyp").unwrap();
        assert_eq!(start.offset(), 0);
        assert_eq!(start.fourcc(), FourCc(*b"ftyp"));
        assert_eq!(buf.as_slice(), &[0, 0, 0, 0, b'f', b't', b'y', b'p']);
        end_box(&mut buf, start).unwrap();
        assert_eq!(buf.u32_at(0), Some(8));
    }

    #[test]
    fn test_full_box_header() {
        let mut buf = ByteBuffer::new();
        let start = begin_full_box(&mut buf, b"tkhd", 0, 0x000007).unwrap();
        end_box(&mut buf, start).unwrap();
        assert_eq!(buf.len(), FULL_BOX_HEADER_SIZE);
        assert_eq!(buf.u32_at(0), Some(12));
        assert_eq!(&buf.as_slice()[4..8], b"tkhd");
        // Version 0, flags 7 → 0x00000007
        assert_eq!(&buf.as_slice()[8..12], &[0x00, 0x00, 0x00, 0x07]);
    }

    #[test]
    fn test_full_box_version_and_flag_mask() {
        let mut buf = ByteBuffer::new();
        let start = begin_full_box(&mut buf, b"mvhd", 1, 0xFF00_0001).unwrap();
        end_box(&mut buf, start).unwrap();
        assert_eq!(&buf.as_slice()[8..12], &[0x01, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_nested_boxes_sizes() {
        let mut buf = ByteBuffer::new();
        let outer = begin_box(&mut buf, b"moov").unwrap();
        let inner = begin_box(&mut buf, b"trak").unwrap();
        buf.append_bytes(&[0xAA; 20]).unwrap();
        end_box(&mut buf, inner).unwrap();
        let empty = begin_box(&mut buf, b"udta").unwrap();
        end_box(&mut buf, empty).unwrap();
        end_box(&mut buf, outer).unwrap();

        // moov = 8 + trak(8 + 20) + udta(8)
        assert_eq!(buf.u32_at(0), Some(44));
        assert_eq!(buf.u32_at(8), Some(28));
        assert_eq!(buf.u32_at(36), Some(8));
        assert_eq!(buf.len(), 44);
    }

    #[test]
    fn test_box_after_prefix_bytes() {
        let mut buf = ByteBuffer::new();
        buf.append_zeros(5).unwrap();
        let start = begin_box(&mut buf, b"free").unwrap();
        buf.append_u16(0).unwrap();
        end_box(&mut buf, start).unwrap();
        assert_eq!(buf.u32_at(5), Some(10));
    }

    #[test]
    fn test_write_fixed_point_16_16() {
        let mut buf = ByteBuffer::new();
        write_fixed_point_16_16(&mut buf, 1.0).unwrap();
        write_fixed_point_16_16(&mut buf, 100.0).unwrap();
        assert_eq!(&buf.as_slice()[..4], &[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(buf.u32_at(4), Some(100 << 16));
    }

    #[test]
    fn test_write_fixed_point_8_8() {
        let mut buf = ByteBuffer::new();
        write_fixed_point_8_8(&mut buf, 1.0).unwrap();
        assert_eq!(buf.as_slice(), &[0x01, 0x00]);
    }

    #[test]
    fn test_unity_matrix() {
        let mut buf = ByteBuffer::new();
        write_unity_matrix(&mut buf).unwrap();
        assert_eq!(buf.len(), 36);
        assert_eq!(buf.u32_at(0), Some(0x0001_0000));
        assert_eq!(buf.u32_at(16), Some(0x0001_0000));
        assert_eq!(buf.u32_at(32), Some(0x4000_0000));
    }

    #[test]
    fn test_encode_language_und() {
        // u=0x15, n=0x0E, d=0x04
        assert_eq!(encode_language("und"), 0x55C4);
        assert_eq!(encode_language("und"), LANGUAGE_UND);
    }

    #[test]
    fn test_encode_language_eng() {
        // (5 << 10) | (14 << 5) | 7
        assert_eq!(encode_language("eng"), 5575);
    }

    #[test]
    fn test_encode_language_invalid_falls_back() {
        assert_eq!(encode_language("en"), LANGUAGE_UND);
        assert_eq!(encode_language("ENG"), LANGUAGE_UND);
    }

    #[test]
    fn test_fourcc_display() {
        assert_eq!(FourCc(*b"url ").to_string(), "url ");
        assert_eq!(FourCc([b'a', 0, b'b', 0xFF]).to_string(), "a?b?");
    }
}
