//! Human-readable hex dumps.
//!
//! Rows look like
//! `00000100  61 62 ff ff ff ff ff ff ff ff ff ff ff ff ff ff  |ab..............|`.
//! Sparse dumps leave unwritten bytes blank and print `...` in place of rows
//! with no data at all.

use std::fmt::Write;

use crate::SegmentStore;

#[derive(Debug, Clone)]
pub struct HexDumpOptions {
    pub bytes_per_row: usize,
    /// Append a `|...|` column with printable ASCII.
    pub ascii: bool,
}

impl Default for HexDumpOptions {
    fn default() -> Self {
        Self {
            bytes_per_row: 16,
            ascii: true,
        }
    }
}

/// Dump a dense buffer whose first byte lives at `base_address`.
pub fn hex_dump(base_address: u32, data: &[u8], options: &HexDumpOptions) -> String {
    let width = options.bytes_per_row.max(1);
    let mut out = String::new();
    for (idx, row) in data.chunks(width).enumerate() {
        let address = base_address.wrapping_add((idx * width) as u32);
        let row: Vec<Option<u8>> = row.iter().copied().map(Some).collect();
        push_row(&mut out, address, &row, width, options.ascii);
    }
    out
}

/// Dump only the rows of `store` that hold data.
pub fn hex_dump_sparse(store: &SegmentStore, options: &HexDumpOptions) -> String {
    let width = options.bytes_per_row.max(1) as u32;
    let mut out = String::new();
    let mut previous: Option<u32> = None;

    for seg in store.segments() {
        let mut row_address = seg.start_address - seg.start_address % width;
        loop {
            // Segments can share a row; it was printed with the earlier one.
            if previous.is_none_or(|p| row_address > p) {
                if previous.is_some_and(|p| p.checked_add(width) != Some(row_address)) {
                    out.push_str("...\n");
                }
                let row = store.read_bytes(row_address, width as usize);
                push_row(&mut out, row_address, &row, width as usize, options.ascii);
                previous = Some(row_address);
            }
            match row_address.checked_add(width) {
                Some(next) if next <= seg.end_address() => row_address = next,
                _ => break,
            }
        }
    }
    out
}

fn push_row(out: &mut String, address: u32, row: &[Option<u8>], width: usize, ascii: bool) {
    let _ = write!(out, "{address:08x} ");
    for idx in 0..width {
        match row.get(idx).copied().flatten() {
            Some(b) => {
                let _ = write!(out, " {b:02x}");
            }
            None => out.push_str("   "),
        }
    }
    if ascii {
        out.push_str("  |");
        for byte in row {
            out.push(match byte {
                Some(b) if b.is_ascii_graphic() || *b == b' ' => *b as char,
                Some(_) => '.',
                None => ' ',
            });
        }
        out.push('|');
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_partial_row_is_padded() {
        let dump = hex_dump(0, &[0x41, 0x00], &HexDumpOptions::default());
        let expected = format!("00000000  41 00{}  |A.|\n", " ".repeat(14 * 3));
        assert_eq!(dump, expected);
    }

    #[test]
    fn test_dense_without_ascii() {
        let options = HexDumpOptions {
            bytes_per_row: 2,
            ascii: false,
        };
        assert_eq!(
            hex_dump(0x10, &[1, 2, 3], &options),
            "00000010  01 02\n00000012  03   \n"
        );
    }

    #[test]
    fn test_sparse_blanks_and_skips() {
        let mut store = SegmentStore::new();
        store.add_bytes(0x02, b"ab").unwrap();
        store.add_bytes(0x08, b"c").unwrap();
        store.add_bytes(0x40, b"xyz").unwrap();
        let dump = hex_dump_sparse(&store, &HexDumpOptions::default());
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("00000000        61 62"));
        assert!(lines[0].ends_with("|  ab    c       |"));
        assert_eq!(lines[1], "...");
        assert!(lines[2].starts_with("00000040  78 79 7a"));
    }

    #[test]
    fn test_sparse_adjacent_rows_have_no_marker() {
        let mut store = SegmentStore::new();
        store.add_bytes(0x0E, &[0x01; 4]).unwrap();
        let dump = hex_dump_sparse(&store, &HexDumpOptions::default());
        assert_eq!(dump.lines().count(), 2);
        assert!(!dump.contains("..."));
    }
}
