//! Growable byte buffer with big-endian integer writes.
//!
//! Every position handed out by the buffer is a plain `usize` offset, so
//! reallocation on growth never invalidates a pending patch site.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::io::Write;

use crate::error::{MuxError, MuxResult};

/// Append-only byte sink. The only in-place mutation is [`ByteBuffer::patch_u32`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with `capacity` bytes reserved up front.
    pub fn with_capacity(capacity: usize) -> MuxResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| MuxError::AllocationFailure {
                requested: capacity,
            })?;
        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Make room for `additional` more bytes.
    ///
    /// On overflow the buffer grows to twice the required length, so a run
    /// of small appends costs amortized O(1).
    pub fn ensure(&mut self, additional: usize) -> MuxResult<()> {
        let required = self
            .data
            .len()
            .checked_add(additional)
            .ok_or(MuxError::AllocationFailure {
                requested: usize::MAX,
            })?;
        if required <= self.data.capacity() {
            return Ok(());
        }
        let target = required.saturating_mul(2);
        self.data
            .try_reserve_exact(target - self.data.len())
            .map_err(|_| MuxError::AllocationFailure { requested: target })
    }

    pub fn append_u8(&mut self, value: u8) -> MuxResult<()> {
        self.ensure(1)?;
        self.data.write_u8(value)?;
        Ok(())
    }

    pub fn append_u16(&mut self, value: u16) -> MuxResult<()> {
        self.ensure(2)?;
        self.data.write_u16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn append_i16(&mut self, value: i16) -> MuxResult<()> {
        self.ensure(2)?;
        self.data.write_i16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn append_u32(&mut self, value: u32) -> MuxResult<()> {
        self.ensure(4)?;
        self.data.write_u32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn append_u64(&mut self, value: u64) -> MuxResult<()> {
        self.ensure(8)?;
        self.data.write_u64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> MuxResult<()> {
        self.ensure(bytes.len())?;
        self.data.write_all(bytes)?;
        Ok(())
    }

    /// Write `count` zero bytes (reserved and pre-defined fields).
    pub fn append_zeros(&mut self, count: usize) -> MuxResult<()> {
        self.ensure(count)?;
        self.data.resize(self.data.len() + count, 0);
        Ok(())
    }

    /// Overwrite four already-written bytes at `offset` with `value`.
    pub fn patch_u32(&mut self, offset: usize, value: u32) -> MuxResult<()> {
        let end = offset.checked_add(4).filter(|&end| end <= self.data.len());
        let Some(end) = end else {
            return Err(MuxError::PatchOutOfBounds {
                offset,
                len: self.data.len(),
            });
        };
        BigEndian::write_u32(&mut self.data[offset..end], value);
        Ok(())
    }

    /// Read back a big-endian `u32` written earlier.
    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        let end = offset.checked_add(4)?;
        self.data.get(offset..end).map(BigEndian::read_u32)
    }
}
