use thiserror::Error;

use crate::dump::{HexDumpOptions, hex_dump};
use crate::io::FILL_BYTE;
use crate::{Segment, SegmentStore};

#[derive(Debug, Error)]
pub enum BoundsError {
    #[error("address {address:#X} is below the image offset {offset:#X}")]
    BeforeOffset { address: u32, offset: u32 },

    #[error(
        "{len} bytes at {address:#X} run past the end of the image ({capacity} bytes at {offset:#X})"
    )]
    PastEnd {
        address: u32,
        len: usize,
        capacity: usize,
        offset: u32,
    },
}

/// A stored run reported relative to the image offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub relative_address: u32,
    pub data: &'a [u8],
}

/// Fixed-size device contents mapped at `offset`. Unwritten bytes read `0xFF`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedImage {
    offset: u32,
    buffer: Vec<u8>,
}

impl BoundedImage {
    pub fn new(capacity: usize, offset: u32) -> Self {
        Self {
            offset,
            buffer: vec![FILL_BYTE; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Absolute address of the first byte.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Buffer index for `len` bytes at absolute `address`, if they fit the window.
    pub fn check_bounds(&self, address: u32, len: usize) -> Result<usize, BoundsError> {
        let start = address
            .checked_sub(self.offset)
            .ok_or(BoundsError::BeforeOffset {
                address,
                offset: self.offset,
            })? as usize;
        if start as u64 + len as u64 > self.buffer.len() as u64 {
            return Err(BoundsError::PastEnd {
                address,
                len,
                capacity: self.buffer.len(),
                offset: self.offset,
            });
        }
        Ok(start)
    }

    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), BoundsError> {
        let start = self.check_bounds(address, data.len())?;
        self.buffer[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Copy every stored segment into the buffer.
    ///
    /// All segments are checked before anything is written, so a failure
    /// leaves the buffer as it was.
    pub fn project(&mut self, store: &SegmentStore) -> Result<(), BoundsError> {
        self.project_segments(store.segments())
    }

    pub(crate) fn project_segments<'a>(
        &mut self,
        segments: impl Iterator<Item = &'a Segment> + Clone,
    ) -> Result<(), BoundsError> {
        for seg in segments.clone() {
            self.check_bounds(seg.start_address, seg.len())?;
        }
        for seg in segments {
            self.write(seg.start_address, &seg.data)?;
        }
        Ok(())
    }

    /// Sum of every buffer byte, padding included, truncated to 16 bits.
    pub fn checksum(&self) -> u16 {
        self.buffer
            .iter()
            .fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
    }

    /// Stored runs relative to the offset, in ascending order.
    ///
    /// Taken from the store rather than the buffer so gaps stay visible.
    /// Runs below the offset are skipped.
    pub fn chunks<'a>(&self, store: &'a SegmentStore) -> impl Iterator<Item = Chunk<'a>> {
        let offset = self.offset;
        store.segments().filter_map(move |seg| {
            Some(Chunk {
                relative_address: seg.start_address.checked_sub(offset)?,
                data: &seg.data,
            })
        })
    }

    /// Hex dump of the whole buffer with absolute addresses.
    pub fn hex_dump(&self) -> String {
        hex_dump(self.offset, &self.buffer, &HexDumpOptions::default())
    }
}
