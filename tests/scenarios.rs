//! End-to-end behaviour of an assembled image.

use eprom_image::{BoundsError, Eprom, Error, StoreError};

#[test]
fn test_two_bytes_in_sixteen_byte_image() {
    let mut eprom = Eprom::new(16, 0);
    eprom.add_bytes(6, b"ab").unwrap();

    assert_eq!(eprom.checksum(), 0xF6B);
    let chunks: Vec<_> = eprom
        .chunks()
        .map(|c| (c.relative_address, c.data.to_vec()))
        .collect();
    assert_eq!(chunks, vec![(6, vec![0x61, 0x62])]);
}

#[test]
fn test_two_disjoint_chunks_keep_gap() {
    let mut eprom = Eprom::new(512, 0);
    eprom.add_bytes(0, b"ab").unwrap();
    eprom.add_bytes(0x20, b"xyz").unwrap();

    let chunks: Vec<_> = eprom
        .chunks()
        .map(|c| (c.relative_address, c.data.to_vec()))
        .collect();
    assert_eq!(chunks, vec![(0, b"ab".to_vec()), (0x20, b"xyz".to_vec())]);

    let bytes = eprom.image().as_bytes();
    assert!(bytes[2..0x20].iter().all(|&b| b == 0xFF));
    assert!(bytes[0x23..].iter().all(|&b| b == 0xFF));
}

#[test]
fn test_chunks_are_relative_to_offset() {
    let mut eprom = Eprom::new(0x1000, 0x8000);
    eprom.add_bytes(0x8100, &[0x01, 0x02]).unwrap();
    eprom.add_bytes(0x8000, &[0x00]).unwrap();

    let starts: Vec<_> = eprom.chunks().map(|c| c.relative_address).collect();
    assert_eq!(starts, vec![0x000, 0x100]);
    let absolute: Vec<_> = eprom.segments().map(|s| s.start_address).collect();
    assert_eq!(absolute, vec![0x8000, 0x8100]);
}

#[test]
fn test_collision_anywhere_in_previous_run() {
    for address in 0x40..0x44 {
        let mut eprom = Eprom::new(0x400, 0);
        eprom.add_bytes(0x40, &[1, 2, 3, 4]).unwrap();
        let err = eprom.add_bytes(address, &[9]).unwrap_err();
        assert!(matches!(
            err,
            Error::Store(StoreError::Collision { address: a }) if a == address
        ));
    }
}

#[test]
fn test_disjoint_add_leaves_first_run_alone() {
    let mut eprom = Eprom::new(0x400, 0);
    eprom.add_bytes(0x40, &[1, 2, 3, 4]).unwrap();
    eprom.add_bytes(0x45, &[5]).unwrap();
    assert_eq!(eprom.store().as_slice()[0].data, vec![1, 2, 3, 4]);
    assert_eq!(eprom.store().len(), 2);
}

#[test]
fn test_window_edges() {
    let offset = 0x2000;
    let capacity = 0x400;
    let end = offset + capacity as u32;

    let mut eprom = Eprom::new(capacity, offset);
    assert!(matches!(
        eprom.add_bytes(offset - 1, &[0x00]),
        Err(Error::Bounds(BoundsError::BeforeOffset { .. }))
    ));

    let mut eprom = Eprom::new(capacity, offset);
    eprom.add_bytes(end - 4, &[0; 4]).unwrap();

    let mut eprom = Eprom::new(capacity, offset);
    assert!(matches!(
        eprom.add_bytes(end - 4, &[0; 5]),
        Err(Error::Bounds(BoundsError::PastEnd { .. }))
    ));
}

#[test]
fn test_blank_checksum_and_delta() {
    for capacity in [16usize, 1024, 0x2000] {
        let eprom = Eprom::new(capacity, 0);
        assert_eq!(eprom.checksum() as usize, (0xFF * capacity) % 0x10000);
    }

    let mut eprom = Eprom::new(0x2000, 0);
    let blank = eprom.checksum() as i64;
    eprom.add_bytes(0x100, &[0x10]).unwrap();
    let expected = (blank + 0x10 - 0xFF).rem_euclid(0x10000);
    assert_eq!(eprom.checksum() as i64, expected);
}

#[test]
fn test_hex_dump_covers_whole_device() {
    let mut eprom = Eprom::new(64, 0x400);
    eprom.add_bytes(0x410, b"Hi").unwrap();
    let dump = eprom.hex_dump();
    let lines: Vec<_> = dump.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("00000410  48 69 ff"));
    assert!(lines[1].ends_with("|Hi..............|"));
}
