mod common;

use common::{default_table, entry, table};
use espfs_lib::partition_table::{find_filesystem_entry, parse_partition_table};
use espfs_lib::{Error, FilesystemKind};

#[test]
fn test_generic_and_filesystem_entry() {
    let data = table(&[
        entry(0x00, 0x00, 0x10000, 0x100000, "factory"),
        entry(0x01, 0x82, 0x200000, 0x100000, "spiffs"),
    ]);

    let region = parse_partition_table(&data).unwrap();
    assert_eq!(region.filesystem_kind(), FilesystemKind::LittleFs);
    assert_eq!(region.start_offset(), 0x200000);
    assert_eq!(region.length(), 0x100000);
    assert_eq!(region.page_size(), 0x100);
    assert_eq!(region.block_size(), 0x1000);
    assert_eq!(region.block_count(), 0x100);
}

#[test]
fn test_default_layout() {
    let entry = find_filesystem_entry(&default_table()).unwrap();
    assert_eq!(entry.type_byte, 0x82);
    assert_eq!(entry.offset, 0x290000);
    assert_eq!(entry.size, 0x160000);
    assert_eq!(entry.label, "spiffs");
    assert_eq!(entry.encoding(), Some("spiffs"));
}

#[test]
fn test_littlefs_tag() {
    let data = table(&[
        entry(0x01, 0x02, 0x9000, 0x5000, "nvs"),
        entry(0x01, 0x83, 0x310000, 0xF0000, "littlefs"),
    ]);

    let entry = find_filesystem_entry(&data).unwrap();
    assert_eq!(entry.encoding(), Some("littlefs"));
    assert_eq!(entry.offset, 0x310000);
    assert_eq!(entry.size, 0xF0000);
}

#[test]
fn test_last_filesystem_entry_wins() {
    let data = table(&[
        entry(0x01, 0x82, 0x200000, 0x100000, "spiffs"),
        entry(0x00, 0x10, 0x10000, 0x100000, "app0"),
        entry(0x01, 0x83, 0x300000, 0x80000, "littlefs"),
    ]);

    let region = parse_partition_table(&data).unwrap();
    assert_eq!(region.start_offset(), 0x300000);
    assert_eq!(region.length(), 0x80000);
}

#[test]
fn test_no_filesystem_entry() {
    let data = table(&[
        entry(0x01, 0x02, 0x9000, 0x5000, "nvs"),
        entry(0x00, 0x10, 0x10000, 0x140000, "app0"),
    ]);

    match parse_partition_table(&data) {
        Err(Error::PartitionNotFound { scanned }) => assert_eq!(scanned, 2),
        other => panic!("expected PartitionNotFound, got {:?}", other),
    }
}

#[test]
fn test_erased_table() {
    let data = vec![0xFF; 0x1000];
    assert!(matches!(
        parse_partition_table(&data),
        Err(Error::PartitionNotFound { scanned: 1 })
    ));
    assert!(matches!(
        parse_partition_table(&[]),
        Err(Error::PartitionNotFound { scanned: 0 })
    ));
}

#[test]
fn test_truncated_filesystem_entry_is_skipped() {
    // The final record is cut off after the offset field
    let mut data = entry(0x01, 0x82, 0x200000, 0x100000, "spiffs");
    let mut cut = entry(0x01, 0x83, 0x300000, 0x80000, "littlefs");
    cut.truncate(8);
    data.extend_from_slice(&cut);

    let entry = find_filesystem_entry(&data).unwrap();
    assert_eq!(entry.offset, 0x200000);
}

#[test]
fn test_misaligned_partition_size_is_rejected() {
    let data = table(&[entry(0x01, 0x82, 0x200000, 0x100800, "spiffs")]);
    assert!(matches!(
        parse_partition_table(&data),
        Err(Error::RegionInvariantViolation(_))
    ));
}

#[test]
fn test_empty_partition_is_rejected() {
    let data = table(&[entry(0x01, 0x83, 0x200000, 0, "littlefs")]);
    assert!(matches!(
        parse_partition_table(&data),
        Err(Error::RegionInvariantViolation(_))
    ));
}
