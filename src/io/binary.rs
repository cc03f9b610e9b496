use super::{FILL_BYTE, FormatError, checked_end, flatten};
use crate::Segment;

#[derive(Debug, Clone)]
pub struct BinaryWriteOptions {
    /// Absolute address of the first byte written.
    pub origin: u32,
    /// Value written into gaps between segments.
    pub fill: u8,
}

impl Default for BinaryWriteOptions {
    fn default() -> Self {
        Self {
            origin: 0,
            fill: FILL_BYTE,
        }
    }
}

/// Parse a raw binary blob into a single segment at the given base address.
pub fn parse_binary(data: &[u8], base_address: u32) -> Result<Vec<Segment>, FormatError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    checked_end(base_address, data.len())?;

    Ok(vec![Segment::new(base_address, data.to_vec())])
}

/// Write segments as one binary blob from `options.origin` to the highest address.
pub fn write_binary(segments: &[Segment], options: &BinaryWriteOptions) -> Vec<u8> {
    flatten(segments, options.origin, options.fill)
}
