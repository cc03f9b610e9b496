use std::fmt;
use std::path::Path;

use log::{debug, warn};

use crate::image::{BoundedImage, Chunk};
use crate::io::{
    BinaryWriteOptions, CSourceWriteOptions, FileFormat, IntelHexWriteOptions,
    RawHexWriteOptions, SRecordWriteOptions, write_binary, write_c_source, write_intel_hex,
    write_raw_hex, write_srec,
};
use crate::store::{CollisionPolicy, SegmentStore};
use crate::{Error, Segment};

/// Conventional EPROM size and placement granule.
const EPROM_GRANULE: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct EpromOptions {
    pub collision_policy: CollisionPolicy,
}

/// A virtual EPROM: the stored segments plus the device image they project onto.
///
/// Addresses passed in are absolute. The first legal address is the offset,
/// and `capacity` bytes are available from there.
#[derive(Debug, Clone)]
pub struct Eprom {
    store: SegmentStore,
    image: BoundedImage,
}

impl Eprom {
    pub fn new(capacity: usize, offset: u32) -> Self {
        Self::with_options(capacity, offset, &EpromOptions::default())
    }

    pub fn with_options(capacity: usize, offset: u32, options: &EpromOptions) -> Self {
        if !capacity.is_multiple_of(EPROM_GRANULE) {
            warn!("EPROM size {capacity} is not a multiple of {EPROM_GRANULE} bytes");
        }
        if !(offset as usize).is_multiple_of(EPROM_GRANULE) {
            warn!("EPROM offset {offset:#X} is not a multiple of {EPROM_GRANULE} bytes");
        }
        debug!("new EPROM image: {capacity} bytes at {offset:#X}");

        Self {
            store: SegmentStore::with_policy(options.collision_policy),
            image: BoundedImage::new(capacity, offset),
        }
    }

    pub fn capacity(&self) -> usize {
        self.image.capacity()
    }

    pub fn offset(&self) -> u32 {
        self.image.offset()
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    pub fn image(&self) -> &BoundedImage {
        &self.image
    }

    /// Stored segments with absolute addresses, in ascending order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + Clone {
        self.store.segments()
    }

    /// Add bytes at an absolute address.
    ///
    /// Fails if the range falls outside the device or any byte is already
    /// written. Nothing changes on failure. Empty `data` is accepted at any
    /// address and changes nothing.
    pub fn add_bytes(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        if data.is_empty() {
            return Ok(());
        }
        self.image.check_bounds(address, data.len())?;
        self.store.add_bytes(address, data)?;
        self.image.write(address, data)?;
        Ok(())
    }

    /// Decode `data` and add its contents. Either every decoded run is added
    /// or none is.
    ///
    /// `base_address` only applies to raw hex and binary input.
    pub fn read(&mut self, data: &[u8], format: FileFormat, base_address: u32) -> Result<(), Error> {
        let segments = format.decode(data, base_address)?;

        let mut staged = self.store.clone();
        for seg in &segments {
            self.image.check_bounds(seg.start_address, seg.len())?;
            staged.add_segment(seg)?;
        }
        self.image.project_segments(segments.iter())?;
        self.store = staged;

        debug!("added {} {format} segment(s)", segments.len());
        Ok(())
    }

    /// Read a file into the image and return the format it was read as.
    ///
    /// With `format` unset the format is picked by [`FileFormat::detect`].
    pub fn read_file(
        &mut self,
        path: impl AsRef<Path>,
        format: Option<FileFormat>,
        base_address: u32,
    ) -> Result<FileFormat, Error> {
        let path = path.as_ref();
        let format = match format {
            Some(format) => format,
            None => FileFormat::detect(path)?,
        };
        let data = std::fs::read(path)?;
        self.read(&data, format, base_address)?;
        debug!("read {} as {format}", path.display());
        Ok(format)
    }

    // --- Export ---

    pub fn to_intel_hex(&self) -> Result<Vec<u8>, Error> {
        Ok(write_intel_hex(
            self.store.as_slice(),
            &IntelHexWriteOptions::default(),
        )?)
    }

    pub fn to_srec(&self) -> Result<Vec<u8>, Error> {
        Ok(write_srec(
            self.store.as_slice(),
            &SRecordWriteOptions::default(),
        )?)
    }

    /// Raw hex text from absolute address `origin` up to the highest stored byte.
    pub fn to_raw_hex(&self, origin: u32) -> Vec<u8> {
        write_raw_hex(
            self.store.as_slice(),
            &RawHexWriteOptions {
                origin,
                ..Default::default()
            },
        )
    }

    /// Binary from absolute address `origin` up to the highest stored byte.
    pub fn to_binary(&self, origin: u32) -> Vec<u8> {
        write_binary(
            self.store.as_slice(),
            &BinaryWriteOptions {
                origin,
                ..Default::default()
            },
        )
    }

    pub fn to_c_source(&self) -> Vec<u8> {
        write_c_source(self.store.as_slice(), &CSourceWriteOptions::default())
    }

    pub fn write_intel_hex(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        write_output(path.as_ref(), &self.to_intel_hex()?, FileFormat::IntelHex.as_str())
    }

    pub fn write_srec(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        write_output(path.as_ref(), &self.to_srec()?, FileFormat::SRecord.as_str())
    }

    pub fn write_raw_hex(&self, path: impl AsRef<Path>, origin: u32) -> Result<(), Error> {
        write_output(path.as_ref(), &self.to_raw_hex(origin), FileFormat::RawHex.as_str())
    }

    pub fn write_binary(&self, path: impl AsRef<Path>, origin: u32) -> Result<(), Error> {
        write_output(path.as_ref(), &self.to_binary(origin), FileFormat::Binary.as_str())
    }

    pub fn write_c_source(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        write_output(path.as_ref(), &self.to_c_source(), "C source")
    }

    // --- Inspection ---

    /// Stored runs with addresses relative to the offset.
    pub fn chunks(&self) -> impl Iterator<Item = Chunk<'_>> {
        self.image.chunks(&self.store)
    }

    pub fn checksum(&self) -> u16 {
        self.image.checksum()
    }

    /// Hex dump of the device contents. Addresses are absolute.
    pub fn hex_dump(&self) -> String {
        self.image.hex_dump()
    }
}

impl PartialEq for Eprom {
    fn eq(&self, other: &Self) -> bool {
        self.image == other.image
    }
}

impl Eq for Eprom {}

impl fmt::Display for Eprom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Size {}  Offset {}  Cksum: {:04X}",
            self.capacity(),
            self.offset(),
            self.checksum()
        )?;
        for seg in self.store.segments() {
            write!(
                f,
                "\nAddress Range 0x{:04X} - 0x{:04X}   Length: 0x{:04X} ({:4})",
                seg.start_address,
                seg.end_address(),
                seg.len(),
                seg.len()
            )?;
        }
        Ok(())
    }
}

fn write_output(path: &Path, data: &[u8], what: &str) -> Result<(), Error> {
    std::fs::write(path, data)?;
    debug!("wrote {} bytes of {what} to {}", data.len(), path.display());
    Ok(())
}
