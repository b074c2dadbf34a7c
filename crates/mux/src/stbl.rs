//! Sample table (`stbl` children) derived from the session's samples.
//!
//! All samples live in a single chunk, so `stsc` and `stco` always hold
//! exactly one entry. The chunk offset is not known while the header tree
//! is being built; [`SampleTable::write`] leaves a zero in its place and
//! hands back a [`PendingChunkOffset`] that is resolved once the header
//! size has been measured.

use crate::atoms::{begin_full_box, end_box, FourCc};
use crate::buffer::ByteBuffer;
use crate::error::{MuxError, MuxResult};
use crate::sample::Sample;

/// One `stts` run: `count` consecutive samples lasting `delta` each.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeToSampleEntry {
    pub count: u32,
    pub delta: u32,
}

/// `stsz` encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleSizes {
    /// Every sample has the same length.
    Uniform { size: u32, count: u32 },
    /// Explicit length for each sample, in order.
    PerSample(Vec<u32>),
}

impl SampleSizes {
    pub fn count(&self) -> u32 {
        match self {
            SampleSizes::Uniform { count, .. } => *count,
            SampleSizes::PerSample(sizes) => sizes.len() as u32,
        }
    }
}

/// Position of the single `stco` entry, still holding a placeholder.
#[must_use = "the chunk offset must be resolved before the header is committed"]
#[derive(Debug, PartialEq, Eq)]
pub struct PendingChunkOffset {
    position: usize,
}

impl PendingChunkOffset {
    pub fn position(&self) -> usize {
        self.position
    }

    /// Rewrite the placeholder with the real start of the sample data.
    pub fn resolve(self, buf: &mut ByteBuffer, data_offset: u64) -> MuxResult<()> {
        let offset = u32::try_from(data_offset).map_err(|_| MuxError::BoxTooLarge {
            fourcc: FourCc(*b"stco"),
            size: data_offset,
        })?;
        buf.patch_u32(self.position, offset)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleTable {
    pub time_to_sample: Vec<TimeToSampleEntry>,
    pub sizes: SampleSizes,
    /// 1-based sync sample numbers, `None` when every sample is sync.
    pub sync_samples: Option<Vec<u32>>,
}

impl SampleTable {
    pub fn build(samples: &[Sample]) -> Self {
        Self {
            time_to_sample: run_length_encode_durations(samples),
            sizes: encode_sizes(samples),
            sync_samples: sync_sample_numbers(samples),
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sizes.count()
    }

    /// Sum of all sample durations, in timescale units.
    pub fn total_duration(&self) -> u64 {
        self.time_to_sample
            .iter()
            .map(|e| e.count as u64 * e.delta as u64)
            .sum()
    }

    /// Write stts, stsc, stsz, stco and (if needed) stss.
    pub fn write(&self, buf: &mut ByteBuffer) -> MuxResult<PendingChunkOffset> {
        self.write_stts(buf)?;
        self.write_stsc(buf)?;
        self.write_stsz(buf)?;
        let pending = write_stco(buf)?;
        if let Some(sync) = &self.sync_samples {
            write_stss(buf, sync)?;
        }
        Ok(pending)
    }

    fn write_stts(&self, buf: &mut ByteBuffer) -> MuxResult<()> {
        let start = begin_full_box(buf, b"stts", 0, 0)?;
        buf.append_u32(self.time_to_sample.len() as u32)?;
        for entry in &self.time_to_sample {
            buf.append_u32(entry.count)?;
            buf.append_u32(entry.delta)?;
        }
        end_box(buf, start)
    }

    fn write_stsc(&self, buf: &mut ByteBuffer) -> MuxResult<()> {
        let start = begin_full_box(buf, b"stsc", 0, 0)?;
        buf.append_u32(1)?; // entry_count
        buf.append_u32(1)?; // first_chunk
        buf.append_u32(self.sample_count())?; // samples_per_chunk
        buf.append_u32(1)?; // sample_description_index
        end_box(buf, start)
    }

    fn write_stsz(&self, buf: &mut ByteBuffer) -> MuxResult<()> {
        let start = begin_full_box(buf, b"stsz", 0, 0)?;
        match &self.sizes {
            SampleSizes::Uniform { size, count } => {
                buf.append_u32(*size)?;
                buf.append_u32(*count)?;
            }
            SampleSizes::PerSample(sizes) => {
                buf.append_u32(0)?;
                buf.append_u32(sizes.len() as u32)?;
                for size in sizes {
                    buf.append_u32(*size)?;
                }
            }
        }
        end_box(buf, start)
    }
}

fn write_stco(buf: &mut ByteBuffer) -> MuxResult<PendingChunkOffset> {
    let start = begin_full_box(buf, b"stco", 0, 0)?;
    buf.append_u32(1)?;
    let position = buf.len();
    buf.append_u32(0)?; // resolved in the second pass
    end_box(buf, start)?;
    Ok(PendingChunkOffset { position })
}

fn write_stss(buf: &mut ByteBuffer, sync: &[u32]) -> MuxResult<()> {
    let start = begin_full_box(buf, b"stss", 0, 0)?;
    buf.append_u32(sync.len() as u32)?;
    for number in sync {
        buf.append_u32(*number)?;
    }
    end_box(buf, start)
}

/// Greedy run-length encoding of adjacent equal durations.
fn run_length_encode_durations(samples: &[Sample]) -> Vec<TimeToSampleEntry> {
    let mut entries: Vec<TimeToSampleEntry> = Vec::new();
    for sample in samples {
        match entries.last_mut() {
            Some(last) if last.delta == sample.duration => last.count += 1,
            _ => entries.push(TimeToSampleEntry {
                count: 1,
                delta: sample.duration,
            }),
        }
    }
    entries
}

fn encode_sizes(samples: &[Sample]) -> SampleSizes {
    match samples.first() {
        // A shared size of zero would read as "table follows".
        Some(first) if first.size() > 0 && samples.iter().all(|s| s.size() == first.size()) => {
            SampleSizes::Uniform {
                size: first.size(),
                count: samples.len() as u32,
            }
        }
        Some(_) => SampleSizes::PerSample(samples.iter().map(Sample::size).collect()),
        None => SampleSizes::Uniform { size: 0, count: 0 },
    }
}

fn sync_sample_numbers(samples: &[Sample]) -> Option<Vec<u32>> {
    if samples.iter().all(|s| s.is_sync) {
        return None;
    }
    Some(
        samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_sync)
            .map(|(i, _)| i as u32 + 1)
            .collect(),
    )
}
