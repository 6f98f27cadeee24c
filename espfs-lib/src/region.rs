//! The resolved filesystem region and the geometry handed to the extractor.

use crate::utils::Utils;
use crate::{Error, Result};
use std::fmt;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FilesystemKind {
    #[strum(serialize = "littlefs")]
    LittleFs,
}

/// Byte range of the filesystem partition in flash.
///
/// Only [`FlashRegion::new`] builds one, so every value satisfies:
/// page and block sizes are powers of two with `block_size >= page_size`,
/// `start_offset` is page aligned, and `length` is a non-zero whole number
/// of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashRegion {
    filesystem_kind: FilesystemKind,
    start_offset: u32,
    length: u32,
    page_size: u32,
    block_size: u32,
}

impl FlashRegion {
    pub fn new(
        filesystem_kind: FilesystemKind,
        start_offset: u32,
        length: u32,
        page_size: u32,
        block_size: u32,
    ) -> Result<Self> {
        if !page_size.is_power_of_two() {
            return Err(Error::invariant(format!(
                "page size {} is not a power of two",
                Utils::hex(page_size)
            )));
        }
        if !block_size.is_power_of_two() {
            return Err(Error::invariant(format!(
                "block size {} is not a power of two",
                Utils::hex(block_size)
            )));
        }
        if block_size < page_size {
            return Err(Error::invariant(format!(
                "block size {} is smaller than page size {}",
                Utils::hex(block_size),
                Utils::hex(page_size)
            )));
        }
        if start_offset % page_size != 0 {
            return Err(Error::invariant(format!(
                "start offset {} is not aligned to page size {}",
                Utils::hex(start_offset),
                Utils::hex(page_size)
            )));
        }
        if length % block_size != 0 {
            return Err(Error::invariant(format!(
                "length {} is not a multiple of block size {}",
                Utils::hex(length),
                Utils::hex(block_size)
            )));
        }
        if length == 0 {
            return Err(Error::invariant("length is zero"));
        }
        if start_offset.checked_add(length).is_none() {
            return Err(Error::invariant(format!(
                "region {}+{} exceeds the 32-bit flash address space",
                Utils::hex(start_offset),
                Utils::hex(length)
            )));
        }

        Ok(Self {
            filesystem_kind,
            start_offset,
            length,
            page_size,
            block_size,
        })
    }

    pub fn filesystem_kind(&self) -> FilesystemKind {
        self.filesystem_kind
    }

    pub fn start_offset(&self) -> u32 {
        self.start_offset
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn block_count(&self) -> u32 {
        self.length / self.block_size
    }

    /// File name the downloaded image is stored under inside the build directory.
    pub fn image_file_name(&self) -> String {
        format!(
            "downloaded_fs_{}_{}.bin",
            Utils::hex(self.start_offset),
            Utils::hex(self.length)
        )
    }
}

impl fmt::Display for FlashRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Start {} Len {} Page size {} Block size {}",
            self.filesystem_kind,
            Utils::hex(self.start_offset),
            Utils::hex(self.length),
            Utils::hex(self.page_size),
            Utils::hex(self.block_size)
        )
    }
}

/// Structural parameters needed to mount a downloaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGeometry {
    pub block_size: u32,
    pub block_count: u32,
}

impl ImageGeometry {
    /// Check a downloaded image of `image_len` bytes against the region it was
    /// read from. The image must be exactly the region and a whole number of
    /// blocks, otherwise mounting it would read garbage or truncate files.
    pub fn for_image(region: &FlashRegion, image_len: u64) -> Result<Self> {
        let block_size = region.block_size();
        if image_len != u64::from(region.length()) || image_len % u64::from(block_size) != 0 {
            return Err(Error::ImageSizeMismatch {
                expected: region.length(),
                actual: image_len,
                block_size,
            });
        }

        Ok(Self {
            block_size,
            block_count: region.block_count(),
        })
    }
}
