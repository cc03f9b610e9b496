use log::warn;

use super::{
    DEFAULT_RECORD_BYTES, FormatError, RangeError, RunBuilder, checked_end, numbered_lines,
    parse_hex_bytes, push_hex_byte, sorted_segments,
};
use crate::Segment;

/// Largest S0 payload: the count byte also covers the address and checksum.
pub const MAX_HEADER_BYTES: usize = u8::MAX as usize - 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SRecordType {
    S1,
    S2,
    S3,
}

impl SRecordType {
    fn address_len(self) -> usize {
        match self {
            SRecordType::S1 => 2,
            SRecordType::S2 => 3,
            SRecordType::S3 => 4,
        }
    }

    fn max_address(self) -> u32 {
        match self {
            SRecordType::S1 => 0xFFFF,
            SRecordType::S2 => 0xFF_FFFF,
            SRecordType::S3 => 0xFFFF_FFFF,
        }
    }

    fn data_digit(self) -> u8 {
        match self {
            SRecordType::S1 => b'1',
            SRecordType::S2 => b'2',
            SRecordType::S3 => b'3',
        }
    }

    fn terminator_digit(self) -> u8 {
        match self {
            SRecordType::S1 => b'9',
            SRecordType::S2 => b'8',
            SRecordType::S3 => b'7',
        }
    }

    fn for_address(max_addr: u32) -> Self {
        if max_addr <= SRecordType::S1.max_address() {
            SRecordType::S1
        } else if max_addr <= SRecordType::S2.max_address() {
            SRecordType::S2
        } else {
            SRecordType::S3
        }
    }
}

#[derive(Debug, Clone)]
pub struct SRecordWriteOptions {
    pub bytes_per_line: u8,
    /// Forced data record type; `None` picks the narrowest that fits.
    pub record_type: Option<SRecordType>,
    /// Payload of the S0 header record. At most [`MAX_HEADER_BYTES`] are
    /// written; the rest is dropped with a warning.
    pub header: Vec<u8>,
    /// Emit an S5/S6 record with the number of data records.
    pub count_record: bool,
}

impl Default for SRecordWriteOptions {
    fn default() -> Self {
        Self {
            bytes_per_line: DEFAULT_RECORD_BYTES,
            record_type: None,
            header: Vec::new(),
            count_record: true,
        }
    }
}

/// Parse Motorola S-Record input into segments, in file order.
pub fn parse_srec(data: &[u8]) -> Result<Vec<Segment>, FormatError> {
    let mut runs = RunBuilder::default();
    let mut data_records: u32 = 0;

    for (line_no, line) in numbered_lines(data) {
        if line.is_empty() {
            continue;
        }
        if line.len() < 2 || (line[0] != b'S' && line[0] != b's') {
            return Err(FormatError::InvalidRecord {
                line: line_no,
                message: "missing S-record prefix".to_string(),
            });
        }

        let record_type = line[1];
        let record_bytes = parse_hex_bytes(&line[2..], line_no)?;
        if record_bytes.is_empty() {
            return Err(FormatError::InvalidRecord {
                line: line_no,
                message: "missing record length".to_string(),
            });
        }

        let count = record_bytes[0] as usize;
        if record_bytes.len() != count + 1 {
            return Err(FormatError::InvalidRecord {
                line: line_no,
                message: format!(
                    "byte count mismatch: expected {}, got {}",
                    count + 1,
                    record_bytes.len()
                ),
            });
        }

        let (&actual, body) = record_bytes
            .split_last()
            .ok_or(FormatError::UnexpectedEof)?;
        let expected = expected_checksum(body);
        if expected != actual {
            return Err(FormatError::ChecksumMismatch {
                line: line_no,
                expected,
                actual,
            });
        }

        let addr_len = match record_type {
            b'0' | b'1' | b'5' | b'9' => 2,
            b'2' | b'6' | b'8' => 3,
            b'3' | b'7' => 4,
            other => {
                return Err(FormatError::UnsupportedRecordType {
                    line: line_no,
                    record_type: other,
                });
            }
        };
        if count < addr_len + 1 {
            return Err(FormatError::InvalidRecord {
                line: line_no,
                message: "record length too short".to_string(),
            });
        }
        let addr = parse_address(&body[1..1 + addr_len]);
        let payload = &body[1 + addr_len..];

        match record_type {
            b'1' | b'2' | b'3' => {
                checked_end(addr, payload.len())?;
                runs.push(addr, payload);
                data_records += 1;
            }
            b'5' | b'6' => {
                if addr != data_records {
                    return Err(FormatError::InvalidRecord {
                        line: line_no,
                        message: format!(
                            "record count mismatch: record says {addr}, found {data_records}"
                        ),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(runs.finish())
}

/// Write segments as Motorola S-Records: header, data, optional count, terminator.
pub fn write_srec(
    segments: &[Segment],
    options: &SRecordWriteOptions,
) -> Result<Vec<u8>, RangeError> {
    let segments = sorted_segments(segments);
    let max_addr = segments
        .iter()
        .map(|s| s.end_address())
        .max()
        .unwrap_or(0);

    let record_type = match options.record_type {
        Some(t) => {
            if max_addr > t.max_address() {
                return Err(RangeError {
                    address: max_addr,
                    limit: t.max_address(),
                    format: "S-Record",
                });
            }
            t
        }
        None => SRecordType::for_address(max_addr),
    };
    let addr_len = record_type.address_len();

    // Count byte covers address, data and checksum.
    let max_per_line = u8::MAX as usize - addr_len - 1;
    let bytes_per_line = if options.bytes_per_line == 0 {
        DEFAULT_RECORD_BYTES as usize
    } else {
        options.bytes_per_line as usize
    }
    .min(max_per_line);

    let mut out = Vec::new();
    if options.header.len() > MAX_HEADER_BYTES {
        warn!(
            "S0 header truncated from {} to {MAX_HEADER_BYTES} bytes",
            options.header.len()
        );
    }
    let header = &options.header[..options.header.len().min(MAX_HEADER_BYTES)];
    push_record(&mut out, b'0', &[0, 0], header);

    let mut data_records: u32 = 0;
    for segment in segments {
        let mut addr = segment.start_address;
        for chunk in segment.data.chunks(bytes_per_line) {
            let addr_bytes = addr.to_be_bytes();
            push_record(&mut out, record_type.data_digit(), &addr_bytes[4 - addr_len..], chunk);
            data_records += 1;
            addr = addr.wrapping_add(chunk.len() as u32);
        }
    }

    if options.count_record {
        let count_bytes = data_records.to_be_bytes();
        if data_records <= 0xFFFF {
            push_record(&mut out, b'5', &count_bytes[2..], &[]);
        } else if data_records <= 0xFF_FFFF {
            push_record(&mut out, b'6', &count_bytes[1..], &[]);
        }
    }

    let zero = [0u8; 4];
    push_record(&mut out, record_type.terminator_digit(), &zero[4 - addr_len..], &[]);

    Ok(out)
}

fn parse_address(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn expected_checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    0xFFu8.wrapping_sub(sum)
}

fn push_record(out: &mut Vec<u8>, record_digit: u8, address: &[u8], data: &[u8]) {
    let mut record = Vec::with_capacity(1 + address.len() + data.len());
    record.push((address.len() + data.len() + 1) as u8);
    record.extend_from_slice(address);
    record.extend_from_slice(data);
    let checksum = expected_checksum(&record);

    out.push(b'S');
    out.push(record_digit);
    for &byte in &record {
        push_hex_byte(out, byte);
    }
    push_hex_byte(out, checksum);
    out.push(b'\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_log::{capture, warnings};

    #[test]
    fn test_srec_roundtrip_s1() {
        let segments = vec![Segment::new(0x1000, vec![0x01, 0x02, 0x03])];
        let options = SRecordWriteOptions {
            record_type: Some(SRecordType::S1),
            ..Default::default()
        };
        let out = write_srec(&segments, &options).unwrap();
        assert_eq!(parse_srec(&out).unwrap(), segments);
    }

    #[test]
    fn test_srec_bad_checksum() {
        let line = b"S11310000102030405060708090A0B0C0D0E0F00\n";
        assert!(matches!(
            parse_srec(line),
            Err(FormatError::ChecksumMismatch { line: 1, .. })
        ));
    }

    #[test]
    fn test_srec_auto_type_s2() {
        let segments = vec![Segment::new(0x1_0000, vec![0x01])];
        let out = write_srec(&segments, &SRecordWriteOptions::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("S0"));
        assert!(lines[1].starts_with("S2"));
        assert!(lines.last().unwrap().starts_with("S8"));
    }

    #[test]
    fn test_srec_forced_type_too_narrow() {
        let segments = vec![Segment::new(0xFFFF, vec![0x01, 0x02])];
        let options = SRecordWriteOptions {
            record_type: Some(SRecordType::S1),
            ..Default::default()
        };
        assert!(matches!(
            write_srec(&segments, &options),
            Err(RangeError {
                address: 0x1_0000,
                limit: 0xFFFF,
                ..
            })
        ));
    }

    #[test]
    fn test_srec_empty_has_framing() {
        let out = write_srec(&[], &SRecordWriteOptions::default()).unwrap();
        assert_eq!(out, b"S0030000FC\nS5030000FC\nS9030000FC\n");
    }

    #[test]
    fn test_long_header_truncated_with_warning() {
        let options = SRecordWriteOptions {
            header: vec![b'H'; 300],
            ..Default::default()
        };
        let (out, records) = capture(|| write_srec(&[], &options).unwrap());
        let text = String::from_utf8(out).unwrap();
        let s0 = text.lines().next().unwrap();
        // "S0", count, 2 address bytes, payload, checksum
        assert_eq!(s0.len(), 2 + 2 + 4 + MAX_HEADER_BYTES * 2 + 2);
        assert_eq!(&s0[2..4], "FF");

        let warned = warnings(&records);
        assert_eq!(warned.len(), 1);
        assert!(warned[0].contains("300"));
    }

    #[test]
    fn test_short_header_no_warning() {
        let options = SRecordWriteOptions {
            header: b"HDR".to_vec(),
            ..Default::default()
        };
        let (_, records) = capture(|| write_srec(&[], &options).unwrap());
        assert!(warnings(&records).is_empty());
    }

    #[test]
    fn test_parse_lowercase_prefix() {
        let data = b"s10500000102f7\ns9030000fc\n";
        let segments = parse_srec(data).unwrap();
        assert_eq!(segments, vec![Segment::new(0x0000, vec![0x01, 0x02])]);
    }

    #[test]
    fn test_parse_ignores_header_and_terminator() {
        let data = b"S00600004844521B\nS10500000102F7\nS5030001FB\nS9030000FC\n";
        let segments = parse_srec(data).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].data, vec![0x01, 0x02]);
    }

    #[test]
    fn test_parse_count_mismatch() {
        let data = b"S10500000102F7\nS5030002FA\n";
        assert!(matches!(
            parse_srec(data),
            Err(FormatError::InvalidRecord { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_reserved_s4() {
        let data = b"S4030000FC\n";
        assert!(matches!(
            parse_srec(data),
            Err(FormatError::UnsupportedRecordType {
                line: 1,
                record_type: b'4'
            })
        ));
    }
}
