use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error("checksum mismatch at line {line}: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch {
        line: usize,
        expected: u8,
        actual: u8,
    },

    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("address overflow: {0}")]
    AddressOverflow(String),

    #[error("invalid hex digit at line {line}: {char}")]
    InvalidHexDigit { line: usize, char: char },

    #[error("unsupported record type at line {line}: {record_type:02X}")]
    UnsupportedRecordType { line: usize, record_type: u8 },

    #[error("unknown file type: {0}")]
    UnknownFileType(String),
}

/// An address does not fit the address field of the target encoding.
#[derive(Debug, Error)]
#[error("address {address:#X} exceeds {format} limit {limit:#X}")]
pub struct RangeError {
    pub address: u32,
    pub limit: u32,
    pub format: &'static str,
}
