#![allow(dead_code)]

/// Build one 32-byte partition table record.
pub fn entry(ptype: u8, subtype: u8, offset: u32, size: u32, label: &str) -> Vec<u8> {
    let mut record = vec![0xAA, 0x50, ptype, subtype];
    record.extend_from_slice(&offset.to_le_bytes());
    record.extend_from_slice(&size.to_le_bytes());
    let mut name = [0u8; 16];
    name[..label.len()].copy_from_slice(label.as_bytes());
    record.extend_from_slice(&name);
    record.extend_from_slice(&[0u8; 4]);
    record
}

/// Concatenate records and pad with erased flash up to 0x1000 bytes.
pub fn table(entries: &[Vec<u8>]) -> Vec<u8> {
    let mut data: Vec<u8> = entries.concat();
    data.resize(0x1000, 0xFF);
    data
}

/// A typical Arduino-ESP32 layout: nvs, otadata, two app slots, spiffs.
pub fn default_table() -> Vec<u8> {
    table(&[
        entry(0x01, 0x02, 0x9000, 0x5000, "nvs"),
        entry(0x01, 0x00, 0xE000, 0x2000, "otadata"),
        entry(0x00, 0x10, 0x10000, 0x140000, "app0"),
        entry(0x00, 0x11, 0x150000, 0x140000, "app1"),
        entry(0x01, 0x82, 0x290000, 0x160000, "spiffs"),
    ])
}
