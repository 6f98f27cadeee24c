//! Resolve, download and unpack in one go.

use crate::extract::{EntryKind, ExtractedEntry, ImageExtractor, list_extracted};
use crate::progress::{ProgressCallbackArc, ProgressHelper, no_op_progress_callback};
use crate::read_flash::FlashReader;
use crate::region::{FlashRegion, ImageGeometry};
use crate::resolver::{FlashRegionResolver, RegionSource};
use crate::utils::Utils;
use crate::Result;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DownloadParams {
    /// Where the partition table and image files are written.
    pub build_dir: PathBuf,
    /// Wiped and recreated before unpacking.
    pub unpack_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub region: FlashRegion,
    pub image_path: PathBuf,
    pub unpack_dir: PathBuf,
    pub entries: Vec<ExtractedEntry>,
}

impl DownloadReport {
    pub fn file_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.kind, EntryKind::File { .. }))
            .count()
    }
}

pub struct FsDownloader<R, X> {
    reader: R,
    extractor: X,
    progress: ProgressHelper,
}

impl<R: FlashReader, X: ImageExtractor> FsDownloader<R, X> {
    pub fn new(reader: R, extractor: X) -> Self {
        Self::with_progress(reader, extractor, no_op_progress_callback())
    }

    pub fn with_progress(reader: R, extractor: X, progress: ProgressCallbackArc) -> Self {
        Self {
            reader,
            extractor,
            progress: ProgressHelper::new(progress, 0),
        }
    }

    pub fn resolve(&mut self, source: &RegionSource) -> Result<FlashRegion> {
        let reader = &mut self.reader;
        self.progress.run_step(
            format!("Retrieving filesystem info for {}...", source.chip_family()),
            |_| FlashRegionResolver::new(reader).resolve(source),
            |region| region.to_string(),
        )
    }

    pub fn run(&mut self, source: &RegionSource, params: &DownloadParams) -> Result<DownloadReport> {
        let region = self.resolve(source)?;

        std::fs::create_dir_all(&params.build_dir)?;
        let image_path = params.build_dir.join(region.image_file_name());
        if image_path.exists() {
            std::fs::remove_file(&image_path)?;
        }

        let reader = &mut self.reader;
        self.progress.run_step(
            "Downloading filesystem image...",
            |handler| {
                handler.set_message(format!(
                    "Reading {} bytes at {}...",
                    Utils::hex(region.length()),
                    Utils::hex(region.start_offset())
                ));
                reader.read_to_file(region.start_offset(), region.length(), &image_path)
            },
            |_| format!("Downloaded {}", image_path.display()),
        )?;

        let image_len = std::fs::metadata(&image_path)?.len();
        let geometry = ImageGeometry::for_image(&region, image_len)?;

        let extractor = &mut self.extractor;
        let entries = self.progress.run_step(
            "Unpacking filesystem image...",
            |handler| -> Result<Vec<ExtractedEntry>> {
                handler.set_message(format!(
                    "Unpacking {} blocks into {}...",
                    geometry.block_count,
                    params.unpack_dir.display()
                ));
                if params.unpack_dir.exists() {
                    std::fs::remove_dir_all(&params.unpack_dir)?;
                }
                std::fs::create_dir_all(&params.unpack_dir)?;
                extractor.extract(&image_path, geometry, &params.unpack_dir)?;
                list_extracted(&params.unpack_dir)
            },
            |entries| format!("Unpacked {} entries", entries.len()),
        )?;

        Ok(DownloadReport {
            region,
            image_path,
            unpack_dir: params.unpack_dir.clone(),
            entries,
        })
    }
}
