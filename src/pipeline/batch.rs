//! Segmenting many pages in parallel.
//!
//! Pages are independent: each worker runs the full pipeline on one page and
//! writes its artifacts. A failing page is recorded in its [`PageReport`] and
//! the batch moves on.

use crate::core::config::BatchConfig;
use crate::core::errors::{SegError, SegResult};
use crate::pipeline::segmenter::PageSegmenter;
use crate::utils::image::load_page_raster;
use crate::utils::output::PageWriter;
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of one page of a batch.
#[derive(Debug)]
pub struct PageReport {
    /// Input image.
    pub path: PathBuf,
    /// Number of lines written; 0 for failed pages.
    pub lines: usize,
    /// Estimated scale, when segmentation got that far.
    pub scale: Option<f32>,
    /// Why the page failed.
    pub error: Option<SegError>,
    /// Wall time spent on the page.
    pub duration: Duration,
}

impl PageReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Statistics over a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    /// The total number of pages processed.
    pub total_pages: usize,
    /// Pages segmented and written.
    pub successful_pages: usize,
    /// Pages rejected by the pipeline (bad geometry, scale, ...).
    pub rejected_pages: usize,
    /// Pages that failed for other reasons (IO, decoding).
    pub failed_pages: usize,
    /// Lines written over all pages.
    pub total_lines: usize,
    /// Average time per page in milliseconds.
    pub average_page_time_ms: f64,
}

impl BatchStats {
    /// Summarizes a set of page reports.
    pub fn from_reports(reports: &[PageReport]) -> Self {
        let mut stats = Self {
            total_pages: reports.len(),
            ..Default::default()
        };
        let mut total_ms = 0.0;
        for report in reports {
            total_ms += report.duration.as_secs_f64() * 1000.0;
            stats.total_lines += report.lines;
            match &report.error {
                None => stats.successful_pages += 1,
                Some(e) if e.is_page_rejection() => stats.rejected_pages += 1,
                Some(_) => stats.failed_pages += 1,
            }
        }
        if !reports.is_empty() {
            stats.average_page_time_ms = total_ms / reports.len() as f64;
        }
        stats
    }

    /// Returns the success rate as a percentage (0.0 to 100.0).
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            (self.successful_pages as f64 / self.total_pages as f64) * 100.0
        }
    }

    /// Returns the average processing speed in pages per second of worker time.
    pub fn pages_per_second(&self) -> f64 {
        if self.average_page_time_ms == 0.0 {
            0.0
        } else {
            1000.0 / self.average_page_time_ms
        }
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch Statistics:")?;
        writeln!(f, "  Total pages: {}", self.total_pages)?;
        writeln!(
            f,
            "  Successful: {} ({:.1}%)",
            self.successful_pages,
            self.success_rate()
        )?;
        writeln!(f, "  Rejected: {}", self.rejected_pages)?;
        writeln!(f, "  Failed: {}", self.failed_pages)?;
        writeln!(f, "  Lines: {}", self.total_lines)?;
        writeln!(f, "  Average page time: {:.2} ms", self.average_page_time_ms)?;
        Ok(())
    }
}

/// Runs a [`PageSegmenter`] over many pages and writes their artifacts.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    segmenter: PageSegmenter,
    writer: PageWriter,
    config: BatchConfig,
}

impl BatchRunner {
    /// Creates a runner writing into `output_dir`; batch settings come from the
    /// segmenter's config.
    pub fn new(segmenter: PageSegmenter, output_dir: impl Into<PathBuf>) -> Self {
        let config = segmenter.config().batch.clone();
        let writer = PageWriter::new(output_dir).with_overlay(config.overlay);
        Self {
            segmenter,
            writer,
            config,
        }
    }

    pub fn writer(&self) -> &PageWriter {
        &self.writer
    }

    /// Segments and writes a single page.
    ///
    /// # Returns
    ///
    /// The estimated scale and the number of lines written.
    pub fn process_page(&self, path: &Path) -> SegResult<(f32, usize)> {
        let raw = load_page_raster(path)?;
        let result = self.segmenter.segment(raw.view())?;
        let lines = self.segmenter.extract_lines(&result);
        let base = self.writer.base_path(path);
        self.writer.write_page(&base, raw.view(), &result, &lines)?;
        Ok((result.scale, lines.len()))
    }

    fn report(&self, path: &Path) -> PageReport {
        let start = Instant::now();
        let outcome = self.process_page(path);
        let duration = start.elapsed();
        match outcome {
            Ok((scale, lines)) => {
                info!("{}: {} lines in {:?}", path.display(), lines, duration);
                PageReport {
                    path: path.to_path_buf(),
                    lines,
                    scale: Some(scale),
                    error: None,
                    duration,
                }
            }
            Err(e) => {
                warn!("{}: {}", path.display(), e);
                PageReport {
                    path: path.to_path_buf(),
                    lines: 0,
                    scale: None,
                    error: Some(e),
                    duration,
                }
            }
        }
    }

    /// Processes all pages, returning one report per input in input order.
    ///
    /// # Errors
    ///
    /// Fails only if the thread pool cannot be built; page failures are
    /// reported per page.
    pub fn run(&self, paths: &[PathBuf]) -> SegResult<Vec<PageReport>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| SegError::config_error(format!("Failed to build thread pool: {e}")))?;
        debug!(
            "processing {} pages on {} threads",
            paths.len(),
            pool.current_num_threads()
        );

        let reports: Vec<PageReport> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| self.report(path))
                .collect()
        });

        let stats = BatchStats::from_reports(&reports);
        info!(
            "batch done: {}/{} pages, {} lines",
            stats.successful_pages, stats.total_pages, stats.total_lines
        );
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SegmentationConfig;
    use crate::pipeline::segmenter::tests::three_row_page;
    use crate::utils::image::float_to_gray;

    #[test]
    fn test_stats_from_reports() {
        let reports = vec![
            PageReport {
                path: "a.png".into(),
                lines: 3,
                scale: Some(16.0),
                error: None,
                duration: Duration::from_millis(30),
            },
            PageReport {
                path: "b.png".into(),
                lines: 0,
                scale: None,
                error: Some(SegError::EmptyImage),
                duration: Duration::from_millis(10),
            },
            PageReport {
                path: "c.png".into(),
                lines: 0,
                scale: None,
                error: Some(SegError::invalid_input("unreadable")),
                duration: Duration::from_millis(20),
            },
        ];
        let stats = BatchStats::from_reports(&reports);
        assert_eq!(stats.total_pages, 3);
        assert_eq!(stats.successful_pages, 1);
        assert_eq!(stats.rejected_pages, 1);
        assert_eq!(stats.failed_pages, 1);
        assert_eq!(stats.total_lines, 3);
        assert!((stats.average_page_time_ms - 20.0).abs() < 1e-6);
        assert!((stats.pages_per_second() - 50.0).abs() < 1e-6);
        assert!(stats.to_string().contains("Rejected: 1"));
    }

    #[test]
    fn test_empty_stats() {
        let stats = BatchStats::from_reports(&[]);
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.pages_per_second(), 0.0);
    }

    #[test]
    fn test_batch_continues_after_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        float_to_gray(three_row_page().view(), false).save(&good).unwrap();
        let blank = dir.path().join("blank.png");
        image::GrayImage::from_pixel(700, 700, image::Luma([255])).save(&blank).unwrap();
        let missing = dir.path().join("missing.png");

        let mut config = SegmentationConfig::default();
        config.batch.threads = 2;
        let segmenter = PageSegmenter::new(config).unwrap();
        let out = dir.path().join("out");
        let runner = BatchRunner::new(segmenter, &out);
        let paths = vec![good.clone(), blank, missing];
        let reports = runner.run(&paths).unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].path, good);
        assert!(reports[0].is_success());
        assert_eq!(reports[0].lines, 3);
        assert!(matches!(reports[1].error, Some(SegError::EmptyImage)));
        assert!(matches!(reports[2].error, Some(SegError::ImageLoad(_))));
        assert!(out.join("good.pseg.png").exists());
        assert!(out.join("good/010003.bin.png").exists());
        assert!(!out.join("blank.bin.png").exists());
    }
}
