use thiserror::Error;

use crate::Segment;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("address {address:#X} is already written")]
    Collision { address: u32 },

    #[error("{len} bytes at {address:#X} run past the end of the address space")]
    AddressOverflow { address: u32, len: usize },
}

/// What to do when new data lands on an address that already holds a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Any second write is an error, even with the same value.
    #[default]
    Reject,
    /// A second write is accepted when it repeats the stored value.
    AllowIdentical,
}

/// Byte runs at absolute addresses, kept sorted and pairwise disjoint.
///
/// Every address can be written once. Runs that touch end to end are
/// coalesced on insert, so iteration yields the fewest segments covering the
/// stored bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentStore {
    segments: Vec<Segment>,
    policy: CollisionPolicy,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            segments: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Segments in ascending address order. Each call starts a fresh pass.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + Clone {
        self.segments.iter()
    }

    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Number of stored segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn min_address(&self) -> Option<u32> {
        self.segments.first().map(|s| s.start_address)
    }

    pub fn max_address(&self) -> Option<u32> {
        self.segments.last().map(|s| s.end_address())
    }

    pub fn total_bytes(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    pub fn add_segment(&mut self, segment: &Segment) -> Result<(), StoreError> {
        self.add_bytes(segment.start_address, &segment.data)
    }

    /// Record `data` at `address`.
    ///
    /// Fails with the first conflicting address if any byte in the range is
    /// already present. A failed add leaves the store unchanged.
    pub fn add_bytes(&mut self, address: u32, data: &[u8]) -> Result<(), StoreError> {
        if data.is_empty() {
            return Ok(());
        }
        let end = u32::try_from(data.len() - 1)
            .ok()
            .and_then(|n| address.checked_add(n))
            .ok_or(StoreError::AddressOverflow {
                address,
                len: data.len(),
            })?;

        // Segments overlapping or touching [address, end].
        let first = self
            .segments
            .partition_point(|s| s.end_address().saturating_add(1) < address);
        let last = first
            + self.segments[first..]
                .iter()
                .take_while(|s| s.start_address <= end.saturating_add(1))
                .count();
        let neighbours = &self.segments[first..last];

        for seg in neighbours {
            self.check_overlap(seg, address, end, data)?;
        }

        if first == last {
            self.segments
                .insert(first, Segment::new(address, data.to_vec()));
            return Ok(());
        }

        let start = self.segments[first].start_address.min(address);
        let stop = self.segments[last - 1].end_address().max(end);
        let mut merged = vec![0u8; (stop - start) as usize + 1];
        for seg in &self.segments[first..last] {
            let at = (seg.start_address - start) as usize;
            merged[at..at + seg.len()].copy_from_slice(&seg.data);
        }
        let at = (address - start) as usize;
        merged[at..at + data.len()].copy_from_slice(data);

        self.segments
            .splice(first..last, [Segment::new(start, merged)]);
        Ok(())
    }

    fn check_overlap(
        &self,
        seg: &Segment,
        address: u32,
        end: u32,
        data: &[u8],
    ) -> Result<(), StoreError> {
        let overlap_start = seg.start_address.max(address);
        let overlap_end = seg.end_address().min(end);
        if overlap_start > overlap_end {
            return Ok(());
        }

        match self.policy {
            CollisionPolicy::Reject => Err(StoreError::Collision {
                address: overlap_start,
            }),
            CollisionPolicy::AllowIdentical => {
                let old = &seg.data[(overlap_start - seg.start_address) as usize..]
                    [..=(overlap_end - overlap_start) as usize];
                let new = &data[(overlap_start - address) as usize..];
                match old.iter().zip(new).position(|(a, b)| a != b) {
                    Some(idx) => Err(StoreError::Collision {
                        address: overlap_start + idx as u32,
                    }),
                    None => Ok(()),
                }
            }
        }
    }

    /// Read a single byte at address. Returns None if address is not covered.
    pub fn read_byte(&self, address: u32) -> Option<u8> {
        let idx = self
            .segments
            .partition_point(|s| s.end_address() < address);
        let seg = self.segments.get(idx)?;
        seg.contains(address)
            .then(|| seg.data[(address - seg.start_address) as usize])
    }

    /// Read bytes from address range. Returns None for gaps.
    pub fn read_bytes(&self, address: u32, len: usize) -> Vec<Option<u8>> {
        (0..len)
            .map(|i| {
                let a = address.checked_add(i as u32)?;
                self.read_byte(a)
            })
            .collect()
    }
}
