use std::path::Path;

use log::debug;

use crate::dump::{HexDumpOptions, hex_dump_sparse};
use crate::io::FileFormat;
use crate::{Error, SegmentStore};

/// Address range of one stored run. `end` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanChunk {
    pub start: u32,
    pub end: u32,
    pub len: usize,
}

/// What a file contains, gathered without a target image.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub format: FileFormat,
    pub min_address: Option<u32>,
    pub max_address: Option<u32>,
    /// Span from the lowest to the highest address, gaps included.
    pub length: u64,
    pub chunks: Vec<ScanChunk>,
    pub hex_dump: String,
}

/// Decode `data` and describe its contents.
pub fn scan(data: &[u8], format: FileFormat, base_address: u32) -> Result<ScanReport, Error> {
    let mut store = SegmentStore::new();
    for seg in format.decode(data, base_address)? {
        store.add_segment(&seg)?;
    }

    let min_address = store.min_address();
    let max_address = store.max_address();
    let length = match (min_address, max_address) {
        (Some(min), Some(max)) => (max - min) as u64 + 1,
        _ => 0,
    };
    let chunks = store
        .segments()
        .map(|seg| ScanChunk {
            start: seg.start_address,
            end: seg.end_address(),
            len: seg.len(),
        })
        .collect();

    Ok(ScanReport {
        format,
        min_address,
        max_address,
        length,
        chunks,
        hex_dump: hex_dump_sparse(&store, &HexDumpOptions::default()),
    })
}

/// Scan a file. With `format` unset the format is picked by [`FileFormat::detect`].
pub fn scan_file(path: impl AsRef<Path>, format: Option<FileFormat>) -> Result<ScanReport, Error> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => FileFormat::detect(path)?,
    };
    let data = std::fs::read(path)?;
    let report = scan(&data, format, 0)?;
    debug!(
        "scanned {} as {format}: {} chunk(s)",
        path.display(),
        report.chunks.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_scan_intel_hex() {
        let input = b":020000001122CB\n:01000400EE0D\n:00000001FF\n";
        let report = scan(input, FileFormat::IntelHex, 0).unwrap();
        assert_eq!(report.format, FileFormat::IntelHex);
        assert_eq!(report.min_address, Some(0));
        assert_eq!(report.max_address, Some(4));
        assert_eq!(report.length, 5);
        assert_eq!(
            report.chunks,
            vec![
                ScanChunk {
                    start: 0,
                    end: 1,
                    len: 2
                },
                ScanChunk {
                    start: 4,
                    end: 4,
                    len: 1
                },
            ]
        );
        assert!(report.hex_dump.starts_with("00000000  11 22       ee"));
    }

    #[test]
    fn test_scan_empty() {
        let report = scan(b"", FileFormat::Binary, 0).unwrap();
        assert_eq!(report.min_address, None);
        assert_eq!(report.length, 0);
        assert!(report.chunks.is_empty());
        assert!(report.hex_dump.is_empty());
    }

    #[test]
    fn test_scan_rejects_overlapping_records() {
        let input = b":020000001122CB\n:01000100EE10\n:00000001FF\n";
        assert!(matches!(
            scan(input, FileFormat::IntelHex, 0),
            Err(Error::Store(StoreError::Collision { address: 1 }))
        ));
    }
}
