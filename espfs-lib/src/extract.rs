//! Unpacking a downloaded filesystem image into a directory.

use crate::region::ImageGeometry;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

/// Mounts an image and copies its tree into `destination`.
pub trait ImageExtractor {
    fn extract(&mut self, image: &Path, geometry: ImageGeometry, destination: &Path) -> Result<()>;
}

impl<T: ImageExtractor + ?Sized> ImageExtractor for &mut T {
    fn extract(&mut self, image: &Path, geometry: ImageGeometry, destination: &Path) -> Result<()> {
        (**self).extract(image, geometry, destination)
    }
}

/// [`ImageExtractor`] backed by the `littlefs-python` command line.
#[derive(Debug, Clone)]
pub struct LittlefsPythonExtractor {
    pub program: PathBuf,
}

impl Default for LittlefsPythonExtractor {
    fn default() -> Self {
        Self {
            program: PathBuf::from("littlefs-python"),
        }
    }
}

impl LittlefsPythonExtractor {
    pub fn args(&self, image: &Path, geometry: ImageGeometry, destination: &Path) -> Vec<String> {
        vec![
            "extract".to_string(),
            image.to_string_lossy().into_owned(),
            destination.to_string_lossy().into_owned(),
            "--block-size".to_string(),
            geometry.block_size.to_string(),
            "--block-count".to_string(),
            geometry.block_count.to_string(),
        ]
    }
}

impl ImageExtractor for LittlefsPythonExtractor {
    fn extract(&mut self, image: &Path, geometry: ImageGeometry, destination: &Path) -> Result<()> {
        let tool = self.program.display().to_string();
        tracing::info!(
            "Unpacking {} ({} blocks of {} bytes) into {}",
            image.display(),
            geometry.block_count,
            geometry.block_size,
            destination.display()
        );

        let status = Command::new(&self.program)
            .args(self.args(image, geometry, destination))
            .status()
            .map_err(|e| Error::extract_failure(&tool, format!("failed to start: {}", e)))?;

        if !status.success() {
            return Err(Error::extract_failure(tool, format!("exited with {}", status)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File { size: u64 },
}

/// One path of an unpacked tree, relative to the unpack directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Walk an unpacked tree, directories before their contents, names sorted.
pub fn list_extracted(root: &Path) -> Result<Vec<ExtractedEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => Error::Io(io),
            None => Error::invalid_input(format!("filesystem loop under {}", root.display())),
        })?;
        let path = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::invalid_input(e.to_string()))?
            .to_path_buf();
        let kind = if entry.file_type().is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File {
                size: entry.metadata().map_err(|e| Error::invalid_input(e.to_string()))?.len(),
            }
        };
        entries.push(ExtractedEntry { path, kind });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn littlefs_python_arguments() {
        let extractor = LittlefsPythonExtractor::default();
        let geometry = ImageGeometry {
            block_size: 0x2000,
            block_count: 253,
        };
        let args = extractor.args(Path::new("fs.bin"), geometry, Path::new("unpacked_fs"));
        assert_eq!(
            args,
            [
                "extract",
                "fs.bin",
                "unpacked_fs",
                "--block-size",
                "8192",
                "--block-count",
                "253",
            ]
        );
    }
}
