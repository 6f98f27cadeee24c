//! Single entry point for locating the filesystem partition.

use crate::address;
use crate::linker_script::{Framework, FsSymbols, LinkerScriptParser};
use crate::partition_table::{self, PARTITION_TABLE_ADDRESS, PARTITION_TABLE_SIZE};
use crate::read_flash::FlashReader;
use crate::region::{FilesystemKind, FlashRegion};
use crate::utils::Utils;
use crate::{Error, Result};
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[strum(serialize_all = "lowercase")]
pub enum ChipFamily {
    /// ESP32 and its variants; the region comes from the on-device partition table
    Esp32,
    /// The region comes from the board's linker script
    Esp8266,
}

/// Where the partition table is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionTableSource {
    pub address: u32,
    pub size: u32,
}

impl Default for PartitionTableSource {
    fn default() -> Self {
        Self {
            address: PARTITION_TABLE_ADDRESS,
            size: PARTITION_TABLE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkerScriptSource {
    /// Used for the flash size hint only; `text` is what gets scanned.
    pub path: String,
    pub text: String,
    pub framework: Framework,
    /// Filesystem the board declares (`board_build.filesystem`).
    pub filesystem: String,
}

impl LinkerScriptSource {
    pub fn load(
        path: impl AsRef<Path>,
        framework: Framework,
        filesystem: impl Into<String>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_string_lossy().into_owned(),
            text,
            framework,
            filesystem: filesystem.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSource {
    PartitionTable(PartitionTableSource),
    LinkerScript(LinkerScriptSource),
}

impl RegionSource {
    pub fn chip_family(&self) -> ChipFamily {
        match self {
            RegionSource::PartitionTable(_) => ChipFamily::Esp32,
            RegionSource::LinkerScript(_) => ChipFamily::Esp8266,
        }
    }
}

/// Apply address translation to linker bounds and build the region.
pub fn linker_region(symbols: &FsSymbols) -> Result<FlashRegion> {
    let start = address::translate(symbols.start)?;
    let end = address::translate(symbols.end)?;
    let length = end.checked_sub(start).ok_or_else(|| {
        Error::invariant(format!(
            "filesystem end {} lies before start {}",
            Utils::hex(end),
            Utils::hex(start)
        ))
    })?;
    FlashRegion::new(
        FilesystemKind::LittleFs,
        start,
        length,
        symbols.page,
        symbols.block,
    )
}

/// Resolve a region from linker script text alone.
pub fn resolve_linker_script(source: &LinkerScriptSource) -> Result<FlashRegion> {
    let kind = FilesystemKind::from_str(&source.filesystem)
        .map_err(|_| Error::UnsupportedFilesystem(source.filesystem.clone()))?;
    tracing::info!("Recognized {} filesystem", kind);

    let parser = LinkerScriptParser::new(source.framework)?;
    let set = parser.parse(&source.path, &source.text)?;
    if let Some(app_size) = set.app_size {
        tracing::debug!("Application size bound 0x{:x}", app_size);
    }
    if let Some(flash_size) = set.flash_size {
        tracing::debug!("Flash size from linker script name 0x{:x}", flash_size);
    }
    linker_region(&set.require()?)
}

pub struct FlashRegionResolver<R: FlashReader> {
    reader: R,
}

impl<R: FlashReader> FlashRegionResolver<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn resolve(&mut self, source: &RegionSource) -> Result<FlashRegion> {
        let region = match source {
            RegionSource::PartitionTable(table) => self.resolve_partition_table(table)?,
            RegionSource::LinkerScript(script) => resolve_linker_script(script)?,
        };
        tracing::info!("Resolved {} region: {}", source.chip_family(), region);
        Ok(region)
    }

    fn resolve_partition_table(&mut self, table: &PartitionTableSource) -> Result<FlashRegion> {
        let file = tempfile::Builder::new()
            .prefix("partition_table_from_flash_")
            .suffix(".bin")
            .tempfile()?;

        self.reader
            .read_to_file(table.address, table.size, file.path())?;

        let data = std::fs::read(file.path())?;
        if data.is_empty() {
            return Err(Error::read_failure(
                "flash reader",
                format!(
                    "partition table read at {} returned no data",
                    Utils::hex(table.address)
                ),
            ));
        }
        tracing::debug!("Read {} partition table bytes", data.len());

        partition_table::parse_partition_table(&data)
    }
}
