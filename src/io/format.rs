use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use super::{
    BinaryWriteOptions, FormatError, IntelHexWriteOptions, RangeError, RawHexWriteOptions,
    SRecordWriteOptions, parse_binary, parse_intel_hex, parse_raw_hex, parse_srec, write_binary,
    write_intel_hex, write_raw_hex, write_srec,
};
use crate::{Error, Segment};

/// Input/output encodings understood by the codec layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    SRecord,
    RawHex,
    IntelHex,
    Binary,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::SRecord => "srecord",
            FileFormat::RawHex => "hex",
            FileFormat::IntelHex => "intelhex",
            FileFormat::Binary => "binary",
        }
    }

    /// Pick a format from the file extension.
    ///
    /// `.hex` is ambiguous: a first line starting with `:` is taken as Intel
    /// HEX, anything else as raw hex. This is a best-effort guess; callers who
    /// know better should pass an explicit format instead.
    pub fn detect(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("s19") => Ok(FileFormat::SRecord),
            Some("bin") => Ok(FileFormat::Binary),
            Some("ihex") => Ok(FileFormat::IntelHex),
            Some("hex") => {
                let mut first_line = Vec::new();
                BufReader::new(File::open(path)?).read_until(b'\n', &mut first_line)?;
                if first_line.first() == Some(&b':') {
                    Ok(FileFormat::IntelHex)
                } else {
                    Ok(FileFormat::RawHex)
                }
            }
            _ => Err(FormatError::UnknownFileType(path.display().to_string()).into()),
        }
    }

    /// Decode `data`. `base_address` only applies to raw hex and binary input.
    pub fn decode(self, data: &[u8], base_address: u32) -> Result<Vec<Segment>, FormatError> {
        match self {
            FileFormat::SRecord => parse_srec(data),
            FileFormat::RawHex => parse_raw_hex(data, base_address),
            FileFormat::IntelHex => parse_intel_hex(data),
            FileFormat::Binary => parse_binary(data, base_address),
        }
    }

    /// Encode with default options. `origin` only applies to raw hex and binary output.
    pub fn encode(self, segments: &[Segment], origin: u32) -> Result<Vec<u8>, RangeError> {
        match self {
            FileFormat::SRecord => write_srec(segments, &SRecordWriteOptions::default()),
            FileFormat::RawHex => Ok(write_raw_hex(
                segments,
                &RawHexWriteOptions {
                    origin,
                    ..Default::default()
                },
            )),
            FileFormat::IntelHex => write_intel_hex(segments, &IntelHexWriteOptions::default()),
            FileFormat::Binary => Ok(write_binary(
                segments,
                &BinaryWriteOptions {
                    origin,
                    ..Default::default()
                },
            )),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "srecord" => Ok(FileFormat::SRecord),
            "hex" => Ok(FileFormat::RawHex),
            "intelhex" => Ok(FileFormat::IntelHex),
            "binary" => Ok(FileFormat::Binary),
            other => Err(FormatError::UnknownFileType(other.to_string())),
        }
    }
}
