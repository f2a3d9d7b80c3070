//! Writing segmentation artifacts to disk.
//!
//! For a page with base path `<base>` the writer produces
//!
//! - `<base>.bin.png`: the binarized page, ink black on white
//! - `<base>.nrm.png`: the normalized gray page
//! - `<base>.pseg.png`: the RGB-encoded segmentation
//! - `<base>/01xxxx.bin.png`: one raster per line, in reading order
//! - `<base>/01xxxx.nrm.png`: gray line crops, when enabled
//! - `<base>.out.png`: line boxes over the input page, when enabled

use crate::core::errors::{SegError, SegResult};
use crate::pipeline::extract::ExtractedLine;
use crate::pipeline::segmenter::PageSegmentation;
use crate::utils::image::{binary_to_page_image, float_to_gray};
use crate::utils::pseg::encode_segmentation;
use crate::utils::visualization::{OverlayConfig, draw_line_boxes};
use image::DynamicImage;
use ndarray::ArrayView2;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Paths written for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenArtifacts {
    /// Page-level images.
    pub pages: Vec<PathBuf>,
    /// Line rasters, in reading order.
    pub lines: Vec<PathBuf>,
}

/// Writes page and line artifacts below an output directory.
#[derive(Debug, Clone)]
pub struct PageWriter {
    output_dir: PathBuf,
    overlay: bool,
}

fn save_image(img: impl Into<DynamicImage>, path: &Path) -> SegResult<()> {
    img.into()
        .save(path)
        .map_err(|e| SegError::image_save(path, e))
}

impl PageWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            overlay: false,
        }
    }

    /// Also draw line boxes over the input page.
    pub fn with_overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Base path of the artifacts for `input`: its file stem inside the output directory.
    pub fn base_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".to_string());
        self.output_dir.join(stem)
    }

    /// Writes all artifacts of one segmented page.
    ///
    /// # Arguments
    ///
    /// * `base` - Base path; suffixes and the line directory are appended to it.
    /// * `raw` - The input page, used for the overlay.
    /// * `result` - The segmented page.
    /// * `lines` - Extracted lines in reading order.
    pub fn write_page(
        &self,
        base: &Path,
        raw: ArrayView2<'_, f32>,
        result: &PageSegmentation,
        lines: &[ExtractedLine],
    ) -> SegResult<WrittenArtifacts> {
        if let Some(parent) = base.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut written = WrittenArtifacts::default();

        let path = with_suffix(base, ".bin.png");
        save_image(binary_to_page_image(result.page.binary.view()), &path)?;
        written.pages.push(path);

        let path = with_suffix(base, ".nrm.png");
        save_image(float_to_gray(result.page.normalized.view(), false), &path)?;
        written.pages.push(path);

        let path = with_suffix(base, ".pseg.png");
        save_image(encode_segmentation(result.segmentation.labels()), &path)?;
        written.pages.push(path);

        if self.overlay {
            let path = with_suffix(base, ".out.png");
            let img = draw_line_boxes(raw, result.segmentation.lines(), &OverlayConfig::default());
            save_image(img, &path)?;
            written.pages.push(path);
        }

        written.lines = self.write_lines(base, lines)?;
        debug!(
            "wrote {} page and {} line images for {}",
            written.pages.len(),
            written.lines.len(),
            base.display()
        );
        Ok(written)
    }

    /// Writes the line rasters into the directory `<base>/`.
    pub fn write_lines(&self, base: &Path, lines: &[ExtractedLine]) -> SegResult<Vec<PathBuf>> {
        std::fs::create_dir_all(base)?;
        let mut paths = Vec::with_capacity(lines.len());
        for line in lines {
            let stem = line.label.file_stem();
            let path = base.join(format!("{stem}.bin.png"));
            save_image(binary_to_page_image(line.binary.view()), &path)?;
            paths.push(path);
            if let Some(gray) = &line.gray {
                let path = base.join(format!("{stem}.nrm.png"));
                save_image(float_to_gray(gray.view(), false), &path)?;
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
