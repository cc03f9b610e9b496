use super::{
    FILL_BYTE, FormatError, checked_end, flatten, hex_digit, numbered_lines, push_hex_byte,
};
use crate::Segment;

#[derive(Debug, Clone)]
pub struct RawHexWriteOptions {
    /// Absolute address of the first byte written.
    pub origin: u32,
    pub bytes_per_line: usize,
    pub fill: u8,
}

impl Default for RawHexWriteOptions {
    fn default() -> Self {
        Self {
            origin: 0,
            bytes_per_line: 16,
            fill: FILL_BYTE,
        }
    }
}

/// Parse raw hex text into a single segment at `base_address`.
///
/// Lines starting with `#` are comments. On every other line each adjacent
/// pair of hex digits is one byte; any other character is skipped.
pub fn parse_raw_hex(data: &[u8], base_address: u32) -> Result<Vec<Segment>, FormatError> {
    let mut bytes = Vec::new();

    for (line_no, line) in numbered_lines(data) {
        if line.is_empty() || line[0] == b'#' {
            continue;
        }
        let digit = |idx: usize| {
            line.get(idx)
                .and_then(|&b| hex_digit(b, line_no).ok())
        };
        let mut idx = 0;
        while idx < line.len() {
            match (digit(idx), digit(idx + 1)) {
                (Some(hi), Some(lo)) => {
                    bytes.push((hi << 4) | lo);
                    idx += 2;
                }
                _ => idx += 1,
            }
        }
    }

    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    checked_end(base_address, bytes.len())?;

    Ok(vec![Segment::new(base_address, bytes)])
}

/// Write segments as raw hex text starting at `options.origin`.
pub fn write_raw_hex(segments: &[Segment], options: &RawHexWriteOptions) -> Vec<u8> {
    let data = flatten(segments, options.origin, options.fill);
    let line_len = if options.bytes_per_line == 0 {
        usize::MAX
    } else {
        options.bytes_per_line
    };

    let mut out = Vec::with_capacity(data.len() * 2 + data.len() / line_len.max(1) + 1);
    for line in data.chunks(line_len) {
        for &byte in line {
            push_hex_byte(&mut out, byte);
        }
        out.push(b'\n');
    }
    out
}
