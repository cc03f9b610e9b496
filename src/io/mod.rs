mod binary;
mod c_source;
mod error;
mod format;
mod intel_hex;
mod raw_hex;
mod srec;

pub use binary::{BinaryWriteOptions, parse_binary, write_binary};
pub use c_source::{CSourceWriteOptions, write_c_source};
pub use error::{FormatError, RangeError};
pub use format::FileFormat;
pub use intel_hex::{IntelHexMode, IntelHexWriteOptions, parse_intel_hex, write_intel_hex};
pub use raw_hex::{RawHexWriteOptions, parse_raw_hex, write_raw_hex};
pub use srec::{MAX_HEADER_BYTES, SRecordType, SRecordWriteOptions, parse_srec, write_srec};

use crate::Segment;

/// Data bytes per record for the Intel HEX and S-Record writers.
pub const DEFAULT_RECORD_BYTES: u8 = 32;

/// Byte value used for gaps when flattening segments.
pub const FILL_BYTE: u8 = 0xFF;

/// Collects decoded data records into segments, extending the current segment
/// while records stay exactly contiguous.
#[derive(Debug, Default)]
pub(crate) struct RunBuilder {
    segments: Vec<Segment>,
    current: Option<Segment>,
}

impl RunBuilder {
    pub(crate) fn push(&mut self, address: u32, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        match &mut self.current {
            Some(seg) if seg.end_address().checked_add(1) == Some(address) => {
                seg.data.extend_from_slice(data);
            }
            Some(seg) => {
                let done = std::mem::replace(seg, Segment::new(address, data.to_vec()));
                self.segments.push(done);
            }
            None => {
                self.current = Some(Segment::new(address, data.to_vec()));
            }
        }
    }

    pub(crate) fn finish(mut self) -> Vec<Segment> {
        if let Some(seg) = self.current.take() {
            self.segments.push(seg);
        }
        self.segments
    }
}

/// Non-empty segments ordered by start address.
pub(crate) fn sorted_segments(segments: &[Segment]) -> Vec<&Segment> {
    let mut sorted: Vec<_> = segments.iter().filter(|s| !s.is_empty()).collect();
    sorted.sort_by_key(|s| s.start_address);
    sorted
}

/// Flatten segments into one buffer starting at `origin`, up to the highest
/// stored address. Bytes below `origin` are dropped.
pub(crate) fn flatten(segments: &[Segment], origin: u32, fill: u8) -> Vec<u8> {
    let Some(max) = segments
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.end_address())
        .max()
    else {
        return Vec::new();
    };
    if max < origin {
        return Vec::new();
    }

    let mut out = vec![fill; (max - origin) as usize + 1];
    for seg in sorted_segments(segments) {
        if seg.end_address() < origin {
            continue;
        }
        let skip = origin.saturating_sub(seg.start_address) as usize;
        let dest = (seg.start_address.max(origin) - origin) as usize;
        let src = &seg.data[skip..];
        out[dest..dest + src.len()].copy_from_slice(src);
    }
    out
}

/// Last address of `len` bytes placed at `base`.
pub(crate) fn checked_end(base: u32, len: usize) -> Result<u32, FormatError> {
    u32::try_from(len.saturating_sub(1))
        .ok()
        .and_then(|n| base.checked_add(n))
        .ok_or_else(|| FormatError::AddressOverflow(format!("{base:#X} + {len} exceeds u32")))
}

pub(crate) fn parse_hex_bytes(data: &[u8], line: usize) -> Result<Vec<u8>, FormatError> {
    if !data.len().is_multiple_of(2) {
        return Err(FormatError::InvalidRecord {
            line,
            message: "odd number of hex digits".to_string(),
        });
    }

    let mut out = Vec::with_capacity(data.len() / 2);
    for pair in data.chunks_exact(2) {
        let high = hex_digit(pair[0], line)?;
        let low = hex_digit(pair[1], line)?;
        out.push((high << 4) | low);
    }
    Ok(out)
}

pub(crate) fn hex_digit(b: u8, line: usize) -> Result<u8, FormatError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        _ => Err(FormatError::InvalidHexDigit {
            line,
            char: b as char,
        }),
    }
}

pub(crate) fn push_hex_byte(out: &mut Vec<u8>, byte: u8) {
    const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
    out.push(HEX_CHARS[(byte >> 4) as usize]);
    out.push(HEX_CHARS[(byte & 0x0F) as usize]);
}

/// Trimmed text lines numbered from 1. Tolerates CRLF.
pub(crate) fn numbered_lines(data: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    data.split(|&b| b == b'\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_ascii()))
}
