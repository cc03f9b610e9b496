//! Assemble fixed-size EPROM images from Intel HEX, Motorola S-Record, raw hex
//! and binary files, and write them back out in any of those formats.
//!
//! [`Eprom`] is the entry point. It keeps every byte added in a
//! [`SegmentStore`], where each address can be written only once, and mirrors
//! it into a [`BoundedImage`] covering `capacity` bytes from `offset`. The
//! codecs in [`io`] can also be used on their own.

pub mod dump;
pub mod eprom;
pub mod error;
pub mod image;
pub mod io;
pub mod scan;
pub mod segment;
pub mod store;

#[cfg(test)]
mod test_log;

pub use dump::{HexDumpOptions, hex_dump, hex_dump_sparse};
pub use eprom::{Eprom, EpromOptions};
pub use error::Error;
pub use image::{BoundedImage, BoundsError, Chunk};
pub use io::{
    BinaryWriteOptions, CSourceWriteOptions, FileFormat, FormatError, IntelHexMode,
    IntelHexWriteOptions, RangeError, RawHexWriteOptions, SRecordType, SRecordWriteOptions,
    parse_binary, parse_intel_hex, parse_raw_hex, parse_srec, write_binary, write_c_source,
    write_intel_hex, write_raw_hex, write_srec,
};
pub use scan::{ScanChunk, ScanReport, scan, scan_file};
pub use segment::Segment;
pub use store::{CollisionPolicy, SegmentStore, StoreError};
