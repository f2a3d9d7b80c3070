//! Single-page driver chaining every segmentation stage.
//!
//! [`PageSegmenter`] owns a validated [`SegmentationConfig`] and an optional
//! debug sink. A page either runs to completion or fails with the first
//! [`SegError`]; no partial results are returned.

use crate::core::config::{ConfigValidator, SegmentationConfig};
use crate::core::debug::{DebugArtifact, DebugSink, NoopSink};
use crate::core::errors::SegResult;
use crate::domain::Segmentation;
use crate::pipeline::binarize::{BinarizedPage, Binarizer, check_binary_page};
use crate::pipeline::colseps::compute_colseps;
use crate::pipeline::extract::{ExtractedLine, extract_lines};
use crate::pipeline::gradmaps::compute_gradmaps;
use crate::pipeline::hlines::remove_hlines;
use crate::pipeline::propagate::{check_line_count, propagate_seeds};
use crate::pipeline::reading_order::{line_candidates, order_lines};
use crate::pipeline::scale::estimate_scale;
use crate::pipeline::seeds::compute_line_seeds;
use crate::processors::labeling::remove_noise;
use crate::utils::image::load_page_raster;
use ndarray::{Array2, ArrayView2};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything computed for one page.
#[derive(Debug, Clone)]
pub struct PageSegmentation {
    /// Binarizer output.
    pub page: BinarizedPage,
    /// Estimated typographic scale.
    pub scale: f32,
    /// Column separator mask.
    pub colseps: Array2<u8>,
    /// Line segmentation in reading order.
    pub segmentation: Segmentation,
    /// Binary page with small specks removed; lines are cut from this raster.
    pub cleaned: Array2<u8>,
}

impl PageSegmentation {
    /// Number of text lines found.
    pub fn line_count(&self) -> usize {
        self.segmentation.len()
    }
}

/// Segments pages into text lines.
///
/// # Example
///
/// ```rust,no_run
/// use oar_pageseg::core::SegmentationConfig;
/// use oar_pageseg::pipeline::PageSegmenter;
/// use std::path::Path;
///
/// let segmenter = PageSegmenter::new(SegmentationConfig::default())?;
/// let result = segmenter.segment_file(Path::new("page.png"))?;
/// for line in segmenter.extract_lines(&result) {
///     println!("{} {:?}", line.label, line.region);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct PageSegmenter {
    config: SegmentationConfig,
    binarizer: Binarizer,
    debug: Arc<dyn DebugSink>,
}

impl std::fmt::Debug for PageSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSegmenter")
            .field("config", &self.config)
            .field("debug", &self.debug.enabled())
            .finish()
    }
}

impl PageSegmenter {
    /// Creates a segmenter after validating `config`.
    pub fn new(config: SegmentationConfig) -> SegResult<Self> {
        config.validate()?;
        Ok(Self {
            binarizer: Binarizer::new(config.binarize.clone()),
            config,
            debug: Arc::new(NoopSink),
        })
    }

    /// Routes intermediate rasters to `sink`.
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.debug = sink;
        self
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Loads a page image and segments it.
    pub fn segment_file(&self, path: &Path) -> SegResult<PageSegmentation> {
        info!("segmenting {}", path.display());
        let raw = load_page_raster(path)?;
        self.segment(raw.view())
    }

    /// Binarizes and segments a raw gray raster.
    pub fn segment(&self, raw: ArrayView2<'_, f32>) -> SegResult<PageSegmentation> {
        let start = Instant::now();
        let page = self.binarizer.binarize(raw, self.debug.as_ref())?;
        debug!("binarized in {:?}", start.elapsed());
        self.segment_binarized(page)
    }

    /// Segments an already binarized page.
    ///
    /// With `binarize.check_page` set the ink raster is checked again, so a
    /// page that came out mostly ink is rejected before scale estimation.
    ///
    /// # Errors
    ///
    /// `LikelyInverted`, `InvalidPageGeometry`, `BadScale`, `TooManyLines` and
    /// `ReadingOrderCycle` reject the page.
    pub fn segment_binarized(&self, page: BinarizedPage) -> SegResult<PageSegmentation> {
        let start = Instant::now();
        let sink = self.debug.as_ref();
        let config = &self.config;

        if config.binarize.check_page
            && let Some(defect) = check_binary_page(&page.binary, &config.binarize)
        {
            warn!("binarized page rejected: {defect}");
            return Err(defect.into());
        }

        let scale = estimate_scale(&page.binary, &config.scale)?;
        let binary = remove_hlines(&page.binary, scale, config.columns.hline_maxsize);
        let separators = compute_colseps(&binary, scale, &config.columns, sink);
        let binary = separators.binary;

        let maps = compute_gradmaps(&binary, scale, &config.lines, sink);
        let (seeds, seed_count) =
            compute_line_seeds(&maps, &separators.colseps, scale, &config.lines, sink);
        let labels = propagate_seeds(&maps.boxmap, &seeds, &binary, scale);
        check_line_count(&labels, config.lines.maxlines)?;
        if sink.enabled() {
            sink.save(
                "llabels",
                DebugArtifact::Gray(labels.mapv(|l| (l % 256) as f32).view()),
            );
        }

        let candidates = line_candidates(&labels, scale, &config.lines);
        let segmentation = order_lines(&labels, &candidates, config.reading_order)?;
        let cleaned = remove_noise(&page.binary, config.extract.noise);
        info!(
            "{} lines from {} seeds (scale {:.1}) in {:?}",
            segmentation.len(),
            seed_count,
            scale,
            start.elapsed()
        );

        Ok(PageSegmentation {
            page,
            scale,
            colseps: separators.colseps,
            segmentation,
            cleaned,
        })
    }

    /// Cuts every line of a segmented page out of its cleaned raster, in reading order.
    pub fn extract_lines(&self, result: &PageSegmentation) -> Vec<ExtractedLine> {
        extract_lines(
            &result.cleaned,
            Some(&result.page.normalized),
            &result.segmentation,
            &self.config.extract,
        )
    }
}
