//! Locate, download and unpack the LittleFS partition of an ESP32/ESP8266.
//!
//! The region is resolved from the partition table read back from the chip
//! (ESP32 family) or from the board's linker script (ESP8266). The resulting
//! [`FlashRegion`] drives the esptool read and the image extraction.

pub mod address;
pub mod download;
pub mod error;
pub mod extract;
pub mod linker_script;
pub mod partition_table;
pub mod progress;
pub mod read_flash;
pub mod region;
pub mod resolver;
pub mod utils;

pub use crate::error::{Error, Result};
pub use download::{DownloadParams, DownloadReport, FsDownloader};
pub use extract::{EntryKind, ExtractedEntry, ImageExtractor, LittlefsPythonExtractor};
pub use linker_script::Framework;
pub use read_flash::{EsptoolReader, FlashReader};
pub use region::{FilesystemKind, FlashRegion, ImageGeometry};
pub use resolver::{
    ChipFamily, FlashRegionResolver, LinkerScriptSource, PartitionTableSource, RegionSource,
};
