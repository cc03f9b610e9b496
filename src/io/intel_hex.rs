use log::trace;

use super::{
    DEFAULT_RECORD_BYTES, FormatError, RangeError, RunBuilder, checked_end, numbered_lines,
    parse_hex_bytes, push_hex_byte, sorted_segments,
};
use crate::Segment;

const RECORD_DATA: u8 = 0x00;
const RECORD_EOF: u8 = 0x01;
const RECORD_EXTENDED_SEGMENT: u8 = 0x02;
const RECORD_START_SEGMENT: u8 = 0x03;
const RECORD_EXTENDED_LINEAR: u8 = 0x04;
const RECORD_START_LINEAR: u8 = 0x05;

/// Highest address reachable with extended segment records.
const MAX_SEGMENT_ADDRESS: u32 = 0xF_FFFF;

/// Which extended address record the writer uses for data above 64 KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntelHexMode {
    /// Extended linear records, emitted only once data leaves the first bank.
    #[default]
    Auto,
    ExtendedLinear,
    ExtendedSegment,
}

#[derive(Debug, Clone)]
pub struct IntelHexWriteOptions {
    pub bytes_per_line: u8,
    pub mode: IntelHexMode,
}

impl Default for IntelHexWriteOptions {
    fn default() -> Self {
        Self {
            bytes_per_line: DEFAULT_RECORD_BYTES,
            mode: IntelHexMode::Auto,
        }
    }
}

/// Parse Intel HEX input into segments, in file order.
///
/// Decoding stops at the first EOF record; anything after it is ignored.
pub fn parse_intel_hex(input: &[u8]) -> Result<Vec<Segment>, FormatError> {
    let mut runs = RunBuilder::default();
    let mut extended_address: u32 = 0;
    let mut eof_seen = false;

    for (line_num, line) in numbered_lines(input) {
        if line.is_empty() {
            continue;
        }

        let Some(hex_str) = line.strip_prefix(b":") else {
            return Err(FormatError::InvalidRecord {
                line: line_num,
                message: "line does not start with ':'".to_string(),
            });
        };
        if hex_str.len() < 10 {
            return Err(FormatError::InvalidRecord {
                line: line_num,
                message: "record too short".to_string(),
            });
        }

        let bytes = parse_hex_bytes(hex_str, line_num)?;
        let byte_count = bytes[0] as usize;
        if bytes.len() != 5 + byte_count {
            return Err(FormatError::InvalidRecord {
                line: line_num,
                message: format!(
                    "byte count mismatch: header says {}, got {}",
                    byte_count,
                    bytes.len() - 5
                ),
            });
        }
        validate_checksum(&bytes, line_num)?;

        let address = u16::from_be_bytes([bytes[1], bytes[2]]);
        let record_type = bytes[3];
        let data = &bytes[4..4 + byte_count];

        match record_type {
            RECORD_DATA => {
                let full_address = extended_address
                    .checked_add(address as u32)
                    .ok_or_else(|| FormatError::AddressOverflow(format!("line {line_num}")))?;
                checked_end(full_address, data.len())?;
                runs.push(full_address, data);
            }
            RECORD_EOF => {
                eof_seen = true;
                break;
            }
            RECORD_EXTENDED_SEGMENT => {
                let base = extended_value(data, line_num, "extended segment address")?;
                extended_address = (base as u32) << 4;
                trace!("line {line_num}: extended segment base {extended_address:#X}");
            }
            RECORD_EXTENDED_LINEAR => {
                let base = extended_value(data, line_num, "extended linear address")?;
                extended_address = (base as u32) << 16;
                trace!("line {line_num}: extended linear base {extended_address:#X}");
            }
            RECORD_START_SEGMENT | RECORD_START_LINEAR => {
                if byte_count != 4 {
                    return Err(FormatError::InvalidRecord {
                        line: line_num,
                        message: "start address record must have 4 data bytes".to_string(),
                    });
                }
            }
            _ => {
                return Err(FormatError::UnsupportedRecordType {
                    line: line_num,
                    record_type,
                });
            }
        }
    }

    if !eof_seen {
        return Err(FormatError::UnexpectedEof);
    }

    Ok(runs.finish())
}

/// Write segments as Intel HEX, always terminated by an EOF record.
///
/// Data records never cross a 64 KiB boundary.
pub fn write_intel_hex(
    segments: &[Segment],
    options: &IntelHexWriteOptions,
) -> Result<Vec<u8>, RangeError> {
    let bytes_per_line = if options.bytes_per_line == 0 {
        DEFAULT_RECORD_BYTES
    } else {
        options.bytes_per_line
    } as usize;

    let mut output = Vec::new();
    // Auto mode starts in bank 0 without an explicit record.
    let mut current_upper: Option<u16> = match options.mode {
        IntelHexMode::Auto => Some(0),
        _ => None,
    };

    for segment in sorted_segments(segments) {
        if options.mode == IntelHexMode::ExtendedSegment
            && segment.end_address() > MAX_SEGMENT_ADDRESS
        {
            return Err(RangeError {
                address: segment.end_address(),
                limit: MAX_SEGMENT_ADDRESS,
                format: "Intel HEX extended segment",
            });
        }

        let mut addr = segment.start_address;
        let mut data_offset = 0;

        while data_offset < segment.len() {
            let upper = (addr >> 16) as u16;
            if current_upper != Some(upper) {
                let (record_type, value) = match options.mode {
                    IntelHexMode::Auto | IntelHexMode::ExtendedLinear => {
                        (RECORD_EXTENDED_LINEAR, upper)
                    }
                    IntelHexMode::ExtendedSegment => (RECORD_EXTENDED_SEGMENT, upper << 12),
                };
                write_record(&mut output, record_type, 0, &value.to_be_bytes());
                current_upper = Some(upper);
            }

            let offset_addr = (addr & 0xFFFF) as u16;
            let remaining_in_bank = 0x10000 - offset_addr as usize;
            let remaining_data = segment.len() - data_offset;
            let chunk_len = bytes_per_line.min(remaining_in_bank).min(remaining_data);

            let chunk = &segment.data[data_offset..data_offset + chunk_len];
            write_record(&mut output, RECORD_DATA, offset_addr, chunk);

            data_offset += chunk_len;
            addr = addr.wrapping_add(chunk_len as u32);
        }
    }

    write_record(&mut output, RECORD_EOF, 0, &[]);
    Ok(output)
}

fn extended_value(data: &[u8], line_num: usize, what: &str) -> Result<u16, FormatError> {
    match data {
        [hi, lo] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(FormatError::InvalidRecord {
            line: line_num,
            message: format!("{what} must have 2 data bytes"),
        }),
    }
}

fn write_record(output: &mut Vec<u8>, record_type: u8, address: u16, data: &[u8]) {
    let byte_count = data.len() as u8;
    let addr_bytes = address.to_be_bytes();

    let mut checksum: u8 = 0;
    checksum = checksum.wrapping_add(byte_count);
    checksum = checksum.wrapping_add(addr_bytes[0]);
    checksum = checksum.wrapping_add(addr_bytes[1]);
    checksum = checksum.wrapping_add(record_type);
    for &b in data {
        checksum = checksum.wrapping_add(b);
    }
    checksum = (!checksum).wrapping_add(1);

    output.push(b':');
    push_hex_byte(output, byte_count);
    push_hex_byte(output, addr_bytes[0]);
    push_hex_byte(output, addr_bytes[1]);
    push_hex_byte(output, record_type);
    for &b in data {
        push_hex_byte(output, b);
    }
    push_hex_byte(output, checksum);
    output.push(b'\n');
}

fn validate_checksum(bytes: &[u8], line_num: usize) -> Result<(), FormatError> {
    let (&actual, body) = bytes
        .split_last()
        .ok_or(FormatError::UnexpectedEof)?;
    let expected = (!body.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))).wrapping_add(1);
    if expected != actual {
        return Err(FormatError::ChecksumMismatch {
            line: line_num,
            expected,
            actual,
        });
    }
    Ok(())
}
