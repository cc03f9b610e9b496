/// A contiguous run of bytes at consecutive absolute addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start_address: u32,
    pub data: Vec<u8>,
}

impl Segment {
    pub fn new(start_address: u32, data: Vec<u8>) -> Self {
        debug_assert!(
            data.is_empty() || start_address.checked_add(data.len() as u32 - 1).is_some(),
            "segment extends past u32::MAX"
        );
        Self {
            start_address,
            data,
        }
    }

    /// Last address covered by this segment (inclusive).
    pub fn end_address(&self) -> u32 {
        if self.data.is_empty() {
            self.start_address
        } else {
            self.start_address + self.data.len() as u32 - 1
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, address: u32) -> bool {
        !self.data.is_empty() && address >= self.start_address && address <= self.end_address()
    }

    pub fn is_contiguous_with(&self, other: &Segment) -> bool {
        self.end_address().checked_add(1) == Some(other.start_address)
    }

    pub fn merge(&mut self, other: Segment) {
        debug_assert!(self.is_contiguous_with(&other));
        self.data.extend(other.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_address() {
        let seg = Segment::new(0x100, vec![0x01, 0x02, 0x03]);
        assert_eq!(seg.end_address(), 0x102);
        assert!(seg.contains(0x100));
        assert!(seg.contains(0x102));
        assert!(!seg.contains(0x103));
    }

    #[test]
    fn test_contiguous_at_top_of_address_space() {
        let top = Segment::new(0xFFFF_FFFF, vec![0xAA]);
        let other = Segment::new(0, vec![0xBB]);
        assert!(!top.is_contiguous_with(&other));
    }

    #[test]
    fn test_merge() {
        let mut a = Segment::new(0x10, vec![0x01]);
        a.merge(Segment::new(0x11, vec![0x02, 0x03]));
        assert_eq!(a.data, vec![0x01, 0x02, 0x03]);
        assert_eq!(a.end_address(), 0x12);
    }
}
