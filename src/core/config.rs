//! Configuration for the page segmentation pipeline.
//!
//! Every tunable of the pipeline lives in [`SegmentationConfig`]. The config is
//! built once (from defaults, TOML or JSON), validated, and then shared read-only
//! by every page a batch processes. Scale-relative values are expressed in units
//! of the estimated typographic scale.

use crate::core::constants::*;
use crate::core::errors::{SegError, SegResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A trait for validating configuration sections.
pub trait ConfigValidator {
    /// Validates the configuration, returning a [`SegError::ConfigError`] on failure.
    fn validate(&self) -> SegResult<()>;
}

#[inline]
fn validate_positive(value: f32, field: &str) -> SegResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SegError::config_error_with_context(
            field,
            &value.to_string(),
            "must be a positive finite number",
        ));
    }
    Ok(())
}

#[inline]
fn validate_range(value: f32, min: f32, max: f32, field: &str) -> SegResult<()> {
    if !(min..=max).contains(&value) {
        return Err(SegError::config_error_with_context(
            field,
            &value.to_string(),
            &format!("must be in range [{min}, {max}]"),
        ));
    }
    Ok(())
}

/// Settings for the Binarizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizeConfig {
    /// Reject pages failing the sanity check. Defaults to true.
    pub check_page: bool,
    /// Minimum page side in pixels. Defaults to 600.
    pub min_page_size: usize,
    /// Maximum page side in pixels. Defaults to 10000.
    pub max_page_size: usize,
    /// Share of near-black/near-white pixels above which flattening is skipped. Defaults to 0.95.
    pub extreme_fraction: f32,
    /// Zoom for background estimation; smaller is faster. Defaults to 0.5.
    pub zoom: f32,
    /// Percentile for the white-level filter. Defaults to 80.
    pub perc: f32,
    /// Window length for the white-level filter. Defaults to 20.
    pub range: usize,
    /// Fraction of the border ignored for threshold estimation. Defaults to 0.1.
    pub bignore: f32,
    /// Scale of the text-region variance mask; 0 disables the mask. Defaults to 1.0.
    pub escale: f32,
    /// Percentile for black estimation. Defaults to 5.
    pub lo: f32,
    /// Percentile for white estimation. Defaults to 90.
    pub hi: f32,
    /// Threshold applied to the rescaled page. Defaults to 0.5.
    pub threshold: f32,
}

impl Default for BinarizeConfig {
    fn default() -> Self {
        Self {
            check_page: true,
            min_page_size: DEFAULT_MIN_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            extreme_fraction: 0.95,
            zoom: 0.5,
            perc: 80.0,
            range: 20,
            bignore: 0.1,
            escale: 1.0,
            lo: 5.0,
            hi: 90.0,
            threshold: 0.5,
        }
    }
}

impl ConfigValidator for BinarizeConfig {
    fn validate(&self) -> SegResult<()> {
        if self.min_page_size > self.max_page_size {
            return Err(SegError::config_error(format!(
                "binarize.min_page_size ({}) exceeds binarize.max_page_size ({})",
                self.min_page_size, self.max_page_size
            )));
        }
        validate_range(self.extreme_fraction, 0.0, 1.0, "binarize.extreme_fraction")?;
        validate_range(self.zoom, 0.01, 1.0, "binarize.zoom")?;
        validate_range(self.perc, 0.0, 100.0, "binarize.perc")?;
        if self.range == 0 {
            return Err(SegError::config_error("binarize.range must be at least 1"));
        }
        validate_range(self.bignore, 0.0, 0.49, "binarize.bignore")?;
        validate_range(self.escale, 0.0, 100.0, "binarize.escale")?;
        validate_range(self.lo, 0.0, 100.0, "binarize.lo")?;
        validate_range(self.hi, 0.0, 100.0, "binarize.hi")?;
        if self.lo >= self.hi {
            return Err(SegError::config_error(
                "binarize.lo must be below binarize.hi",
            ));
        }
        validate_range(self.threshold, 0.0, 1.0, "binarize.threshold")
    }
}

/// Settings for the Scale Estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Open interval of component sizes considered typographic. Defaults to (3, 100).
    pub scale_range: (f32, f32),
    /// Estimates at or above this value reject the page. Defaults to 1000.
    pub max_scale: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            scale_range: (3.0, 100.0),
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}

impl ConfigValidator for ScaleConfig {
    fn validate(&self) -> SegResult<()> {
        let (lo, hi) = self.scale_range;
        if !(lo >= 0.0 && lo < hi) {
            return Err(SegError::config_error(format!(
                "scale.scale_range must satisfy 0 <= lo < hi, got ({lo}, {hi})"
            )));
        }
        validate_positive(self.max_scale, "scale.max_scale")
    }
}

/// Settings for column separator detection and horizontal rule removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Components wider than this many scales are treated as rules. Defaults to 10.
    pub hline_maxsize: f32,
    /// Maximum number of whitespace column separators. Defaults to 3.
    pub maxcolseps: usize,
    /// Maximum number of black column separators; 0 disables them. Defaults to 0.
    pub maxseps: usize,
    /// Minimum column separator height in scales. Defaults to 10.
    pub csminheight: f32,
    /// Widening of black separators in pixels. Defaults to 10.
    pub sepwiden: usize,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            hline_maxsize: 10.0,
            maxcolseps: 3,
            maxseps: 0,
            csminheight: 10.0,
            sepwiden: 10,
        }
    }
}

impl ConfigValidator for ColumnConfig {
    fn validate(&self) -> SegResult<()> {
        validate_positive(self.hline_maxsize, "columns.hline_maxsize")?;
        validate_positive(self.csminheight, "columns.csminheight")
    }
}

/// Settings for gradient maps, seeds and label propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Relative threshold for line-bottom markers; tops use half of it. Defaults to 0.2.
    pub threshold: f32,
    /// Horizontal scale multiplier for gradient smoothing. Defaults to 1.0.
    pub hscale: f32,
    /// Vertical scale multiplier for gradient smoothing. Defaults to 1.0.
    pub vscale: f32,
    /// Use a pure Gaussian instead of the Gaussian plus box filter. Defaults to false.
    pub usegauss: bool,
    /// Component size range, in scales, admitted to the boxmap. Defaults to (0.5, 4).
    pub boxmap_range: (f32, f32),
    /// Maximum number of lines per page. Defaults to 300.
    pub maxlines: usize,
    /// Lines narrower than this many scales are dropped. Defaults to 2.
    pub min_line_width: f32,
    /// Lines shorter than this many scales are dropped. Defaults to 1.
    pub min_line_height: f32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            hscale: 1.0,
            vscale: 1.0,
            usegauss: false,
            boxmap_range: (0.5, 4.0),
            maxlines: DEFAULT_MAX_LINES,
            min_line_width: 2.0,
            min_line_height: 1.0,
        }
    }
}

impl ConfigValidator for LineConfig {
    fn validate(&self) -> SegResult<()> {
        validate_range(self.threshold, 0.0, 1.0, "lines.threshold")?;
        validate_positive(self.hscale, "lines.hscale")?;
        validate_positive(self.vscale, "lines.vscale")?;
        let (lo, hi) = self.boxmap_range;
        if !(lo >= 0.0 && lo < hi) {
            return Err(SegError::config_error(format!(
                "lines.boxmap_range must satisfy 0 <= lo < hi, got ({lo}, {hi})"
            )));
        }
        if self.maxlines == 0 || self.maxlines > MAX_LINE_INDEX as usize {
            return Err(SegError::config_error_with_context(
                "lines.maxlines",
                &self.maxlines.to_string(),
                &format!("must be in range [1, {MAX_LINE_INDEX}]"),
            ));
        }
        validate_range(self.min_line_width, 0.0, 1000.0, "lines.min_line_width")?;
        validate_range(self.min_line_height, 0.0, 1000.0, "lines.min_line_height")
    }
}

/// How the precedes relation between two lines is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadingOrderMode {
    /// Column aware: lines sharing horizontal extent read top-to-bottom, others
    /// left-to-right unless a third line separates them.
    #[default]
    Columns,
    /// Lines with overlapping vertical extents read left-to-right, all others
    /// top-to-bottom.
    RowMajor,
}

/// Settings for line extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Components below this pixel count are removed before extraction. Defaults to 8.
    pub noise: usize,
    /// Padding around each extracted line. Defaults to 3.
    pub pad: usize,
    /// Square mask expansion in pixels. Defaults to 3.
    pub expand: usize,
    /// Also extract grayscale lines from the normalized page. Defaults to false.
    pub gray: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            noise: DEFAULT_NOISE,
            pad: DEFAULT_PAD,
            expand: DEFAULT_EXPAND,
            gray: false,
        }
    }
}

impl ConfigValidator for ExtractConfig {
    fn validate(&self) -> SegResult<()> {
        if self.expand > 255 {
            return Err(SegError::config_error_with_context(
                "extract.expand",
                &self.expand.to_string(),
                "must not exceed 255",
            ));
        }
        Ok(())
    }
}

/// Settings for batch runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads; 0 uses all available cores.
    pub threads: usize,
    /// Draw line boxes over the input page. Defaults to false.
    pub overlay: bool,
}

/// Complete, immutable configuration of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Reading order relation.
    pub reading_order: ReadingOrderMode,
    /// Binarizer settings.
    pub binarize: BinarizeConfig,
    /// Scale estimator settings.
    pub scale: ScaleConfig,
    /// Column separator and rule removal settings.
    pub columns: ColumnConfig,
    /// Line finding settings.
    pub lines: LineConfig,
    /// Line extraction settings.
    pub extract: ExtractConfig,
    /// Batch settings.
    pub batch: BatchConfig,
}

impl ConfigValidator for SegmentationConfig {
    fn validate(&self) -> SegResult<()> {
        self.binarize.validate()?;
        self.scale.validate()?;
        self.columns.validate()?;
        self.lines.validate()?;
        self.extract.validate()
    }
}

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration loader for the segmentation pipeline.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a configuration file, auto-detecting the format from the extension.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use oar_pageseg::core::config::ConfigLoader;
    /// use std::path::Path;
    ///
    /// let config = ConfigLoader::load_from_file(Path::new("pageseg.toml"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_from_file(path: &Path) -> SegResult<SegmentationConfig> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            SegError::config_error(format!(
                "Unsupported config file extension: {:?}",
                path.extension()
            ))
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| {
            SegError::config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::load_from_string(&content, format)
    }

    /// Load and validate configuration from a string with specified format.
    pub fn load_from_string(content: &str, format: ConfigFormat) -> SegResult<SegmentationConfig> {
        let config: SegmentationConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| SegError::config_error(format!("Failed to parse TOML config: {e}")))?,
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| SegError::config_error(format!("Failed to parse JSON config: {e}")))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize a configuration to a string in the given format.
    pub fn save_to_string(config: &SegmentationConfig, format: ConfigFormat) -> SegResult<String> {
        match format {
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| {
                SegError::config_error(format!("Failed to serialize TOML config: {e}"))
            }),
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                SegError::config_error(format!("Failed to serialize JSON config: {e}"))
            }),
        }
    }
}
