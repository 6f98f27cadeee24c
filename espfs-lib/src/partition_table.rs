//! ESP32 binary partition table decoding.
//!
//! The table lives at a fixed flash address and is a run of 32-byte records,
//! each starting with the magic `0xAA 0x50`:
//!
//! ```text
//! magic(2) type(1) subtype(1) offset(4, LE) size(4, LE) label(16) flags(4)
//! ```
//!
//! Splitting the buffer on the magic leaves one fragment per record with the
//! magic stripped, so the filesystem tag sits at index 1 of each fragment.

use crate::region::{FilesystemKind, FlashRegion};
use crate::{Error, Result};
use phf::phf_map;

pub const PARTITION_TABLE_ADDRESS: u32 = 0x8000;
pub const PARTITION_TABLE_SIZE: u32 = 0x1000;

pub const PAGE_SIZE: u32 = 0x100;
pub const BLOCK_SIZE: u32 = 0x1000;

const ENTRY_MAGIC: [u8; 2] = [0xAA, 0x50];
const TAG_INDEX: usize = 1;
const OFFSET_RANGE: std::ops::Range<usize> = 2..6;
const SIZE_RANGE: std::ops::Range<usize> = 6..10;
const LABEL_RANGE: std::ops::Range<usize> = 10..26;

/// Data subtypes that hold a filesystem this tool can download.
static FILESYSTEM_TAGS: phf::Map<u8, &'static str> = phf_map! {
    0x82u8 => "spiffs",
    0x83u8 => "littlefs",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionEntry {
    pub type_byte: u8,
    pub offset: u32,
    pub size: u32,
    pub label: String,
}

impl PartitionEntry {
    /// Name of the filesystem encoding the entry's tag stands for.
    pub fn encoding(&self) -> Option<&'static str> {
        FILESYSTEM_TAGS.get(&self.type_byte).copied()
    }
}

/// Split `data` on the entry magic, dropping empty fragments.
fn fragments(data: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + ENTRY_MAGIC.len() <= data.len() {
        if data[i..i + ENTRY_MAGIC.len()] == ENTRY_MAGIC {
            out.push(&data[start..i]);
            i += ENTRY_MAGIC.len();
            start = i;
        } else {
            i += 1;
        }
    }
    out.push(&data[start..]);
    out.retain(|fragment| !fragment.is_empty());
    out
}

fn read_u32_le(fragment: &[u8], range: std::ops::Range<usize>) -> Option<u32> {
    let bytes: [u8; 4] = fragment.get(range)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

fn read_label(fragment: &[u8]) -> String {
    let raw = match fragment.get(LABEL_RANGE) {
        Some(raw) => raw,
        None => fragment.get(LABEL_RANGE.start..).unwrap_or_default(),
    };
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Find the filesystem entry in a raw partition table.
///
/// When several entries carry a filesystem tag the last one in table order
/// is returned.
pub fn find_filesystem_entry(data: &[u8]) -> Result<PartitionEntry> {
    let fragments = fragments(data);
    let mut found = None;

    for (index, fragment) in fragments.iter().enumerate() {
        let Some(&tag) = fragment.get(TAG_INDEX) else {
            continue;
        };
        let Some(encoding) = FILESYSTEM_TAGS.get(&tag) else {
            continue;
        };
        let (Some(offset), Some(size)) = (
            read_u32_le(fragment, OFFSET_RANGE),
            read_u32_le(fragment, SIZE_RANGE),
        ) else {
            tracing::warn!(
                "Skipping truncated {} entry #{} ({} bytes)",
                encoding,
                index,
                fragment.len()
            );
            continue;
        };

        let entry = PartitionEntry {
            type_byte: tag,
            offset,
            size,
            label: read_label(fragment),
        };
        tracing::debug!(
            "Partition entry #{} '{}': {} at 0x{:x} size 0x{:x}",
            index,
            entry.label,
            encoding,
            offset,
            size
        );
        if let Some(previous) = found.replace(entry) {
            tracing::debug!(
                "Entry '{}' at 0x{:x} superseded by a later filesystem entry",
                previous.label,
                previous.offset
            );
        }
    }

    found.ok_or(Error::PartitionNotFound {
        scanned: fragments.len(),
    })
}

/// Decode a raw partition table into the filesystem region.
pub fn parse_partition_table(data: &[u8]) -> Result<FlashRegion> {
    let entry = find_filesystem_entry(data)?;
    FlashRegion::new(
        FilesystemKind::LittleFs,
        entry.offset,
        entry.size,
        PAGE_SIZE,
        BLOCK_SIZE,
    )
}
