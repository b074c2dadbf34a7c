//! Minimal MP4 re-parser for checking muxer output.
//!
//! Walks the box tree recursively and fails if any declared box size
//! disagrees with the bytes actually present.

#![allow(dead_code)]

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

/// Boxes whose payload is nothing but child boxes.
const CONTAINERS: &[&[u8; 4]] = &[b"moov", b"trak", b"mdia", b"minf", b"dinf", b"stbl"];

/// One parsed box and its children.
#[derive(Debug, Clone)]
pub struct ParsedBox {
    pub fourcc: [u8; 4],
    /// Offset of the size field in the file.
    pub offset: usize,
    /// Declared size, header included.
    pub size: usize,
    pub children: Vec<ParsedBox>,
}

impl ParsedBox {
    pub fn payload_offset(&self) -> usize {
        self.offset + 8
    }

    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    pub fn child(&self, fourcc: &[u8; 4]) -> Option<&ParsedBox> {
        self.children.iter().find(|c| &c.fourcc == fourcc)
    }
}

fn fourcc_to_string(fourcc: &[u8; 4]) -> String {
    String::from_utf8_lossy(fourcc).into_owned()
}

/// Where the children of a box start, relative to its payload, if it has any.
fn child_start(fourcc: &[u8; 4]) -> Option<usize> {
    if CONTAINERS.contains(&fourcc) {
        return Some(0);
    }
    match fourcc {
        // full box header + entry_count
        b"stsd" | b"dref" => Some(8),
        // VisualSampleEntry fields
        b"avc1" | b"raw " => Some(78),
        _ => None,
    }
}

/// Parse every box in `data[start..end]`; the boxes must tile the range exactly.
fn parse_range(data: &[u8], start: usize, end: usize) -> Result<Vec<ParsedBox>, String> {
    let mut boxes = Vec::new();
    let mut pos = start;

    while pos < end {
        if end - pos < 8 {
            return Err(format!("{} trailing bytes at offset {pos}", end - pos));
        }
        let mut cursor = Cursor::new(&data[pos..pos + 8]);
        let size = cursor.read_u32::<BigEndian>().map_err(|e| e.to_string())? as usize;
        let mut fourcc = [0u8; 4];
        for b in &mut fourcc {
            *b = cursor.read_u8().map_err(|e| e.to_string())?;
        }

        if size < 8 {
            return Err(format!(
                "box '{}' at {pos} declares size {size}",
                fourcc_to_string(&fourcc)
            ));
        }
        if pos + size > end {
            return Err(format!(
                "box '{}' at {pos} size {size} overruns parent ending at {end}",
                fourcc_to_string(&fourcc)
            ));
        }

        let children = match child_start(&fourcc) {
            Some(skip) => parse_range(data, pos + 8 + skip, pos + size)?,
            None => Vec::new(),
        };

        boxes.push(ParsedBox {
            fourcc,
            offset: pos,
            size,
            children,
        });
        pos += size;
    }

    Ok(boxes)
}

/// Parse a whole file. Errors describe the first structural defect found.
pub fn parse_file(data: &[u8]) -> Result<Vec<ParsedBox>, String> {
    parse_range(data, 0, data.len())
}

/// Follow a path of box types from the top level.
pub fn find_path<'a>(boxes: &'a [ParsedBox], path: &[&[u8; 4]]) -> Option<&'a ParsedBox> {
    let (first, rest) = path.split_first()?;
    let mut current = boxes.iter().find(|b| &b.fourcc == *first)?;
    for fourcc in rest {
        current = current.child(fourcc)?;
    }
    Some(current)
}

/// Path to a sample table child box, e.g. `stbl_box(&boxes, b"stts")`.
pub fn stbl_box<'a>(boxes: &'a [ParsedBox], fourcc: &[u8; 4]) -> Option<&'a ParsedBox> {
    find_path(
        boxes,
        &[b"moov", b"trak", b"mdia", b"minf", b"stbl", fourcc],
    )
}

pub fn u32_at(data: &[u8], offset: usize) -> u32 {
    let mut cursor = Cursor::new(&data[offset..offset + 4]);
    cursor.read_u32::<BigEndian>().unwrap()
}

pub fn u64_at(data: &[u8], offset: usize) -> u64 {
    let mut cursor = Cursor::new(&data[offset..offset + 8]);
    cursor.read_u64::<BigEndian>().unwrap()
}

/// Read the u32 words of a full box payload after version/flags.
fn full_box_words(data: &[u8], b: &ParsedBox) -> Vec<u32> {
    let mut cursor = Cursor::new(&data[b.payload_offset() + 4..b.end()]);
    let mut words = Vec::new();
    while let Ok(word) = cursor.read_u32::<BigEndian>() {
        words.push(word);
    }
    words
}

/// `stts` entries as `(count, delta)`.
pub fn read_stts(data: &[u8], b: &ParsedBox) -> Vec<(u32, u32)> {
    let words = full_box_words(data, b);
    assert_eq!(words.len(), 1 + 2 * words[0] as usize);
    words[1..].chunks(2).map(|c| (c[0], c[1])).collect()
}

/// `stsc` entries as `(first_chunk, samples_per_chunk, description_index)`.
pub fn read_stsc(data: &[u8], b: &ParsedBox) -> Vec<(u32, u32, u32)> {
    let words = full_box_words(data, b);
    assert_eq!(words.len(), 1 + 3 * words[0] as usize);
    words[1..].chunks(3).map(|c| (c[0], c[1], c[2])).collect()
}

/// `stsz` as `(sample_size, sample_count, per-sample sizes)`.
pub fn read_stsz(data: &[u8], b: &ParsedBox) -> (u32, u32, Vec<u32>) {
    let words = full_box_words(data, b);
    let (size, count) = (words[0], words[1]);
    let table = words[2..].to_vec();
    if size == 0 {
        assert_eq!(table.len(), count as usize);
    } else {
        assert!(table.is_empty());
    }
    (size, count, table)
}

/// `stco` or `stss` entries.
pub fn read_u32_list(data: &[u8], b: &ParsedBox) -> Vec<u32> {
    let words = full_box_words(data, b);
    assert_eq!(words.len(), 1 + words[0] as usize);
    words[1..].to_vec()
}

/// Expand `stsz` into one size per sample.
pub fn sample_sizes(data: &[u8], boxes: &[ParsedBox]) -> Vec<u32> {
    let (size, count, table) = read_stsz(data, stbl_box(boxes, b"stsz").unwrap());
    if size == 0 {
        table
    } else {
        vec![size; count as usize]
    }
}

/// Expand `stts` into one duration per sample.
pub fn sample_durations(data: &[u8], boxes: &[ParsedBox]) -> Vec<u32> {
    read_stts(data, stbl_box(boxes, b"stts").unwrap())
        .into_iter()
        .flat_map(|(count, delta)| std::iter::repeat(delta).take(count as usize))
        .collect()
}
