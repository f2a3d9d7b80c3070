//! Error types for the page segmentation pipeline.
//!
//! Errors fall into two groups. Page rejections ([`SegError::InvalidPageGeometry`],
//! [`SegError::LikelyInverted`], [`SegError::EmptyImage`], [`SegError::BadScale`],
//! [`SegError::TooManyLines`], [`SegError::ReadingOrderCycle`]) abort the current
//! page only; a batch records them and moves on. The remaining variants cover
//! image IO, configuration and raster shape problems.

use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type SegResult<T> = Result<T, SegError>;

/// Enum representing the stage of the pipeline an error or diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Page normalization and thresholding.
    Binarization,
    /// Typographic scale estimation.
    ScaleEstimation,
    /// Column and line segmentation.
    Segmentation,
    /// Reading order computation.
    ReadingOrder,
    /// Line extraction and artifact writing.
    Output,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStage::Binarization => write!(f, "binarization"),
            ProcessingStage::ScaleEstimation => write!(f, "scale estimation"),
            ProcessingStage::Segmentation => write!(f, "segmentation"),
            ProcessingStage::ReadingOrder => write!(f, "reading order"),
            ProcessingStage::Output => write!(f, "output"),
        }
    }
}

/// Diagnostic returned by the page sanity check.
///
/// The check never fails hard on its own; callers turn a defect into a
/// [`SegError`] when they decide to reject the page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageDefect {
    /// The raster has more than one channel.
    Color { shape: Vec<usize> },
    /// Mean below median on the ink-polarity raster.
    Inverted,
    /// Height below the configured minimum.
    TooShort { height: usize, min: usize },
    /// Height above the configured maximum.
    TooTall { height: usize, max: usize },
    /// Width below the configured minimum.
    TooNarrow { width: usize, min: usize },
    /// Width above the configured maximum.
    TooWide { width: usize, max: usize },
}

impl fmt::Display for PageDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageDefect::Color { shape } => write!(f, "input image is color image {shape:?}"),
            PageDefect::Inverted => write!(f, "image may be inverted"),
            PageDefect::TooShort { height, min } => {
                write!(f, "image not tall enough for a page image ({height} < {min})")
            }
            PageDefect::TooTall { height, max } => {
                write!(f, "image too tall for a page image ({height} > {max})")
            }
            PageDefect::TooNarrow { width, min } => {
                write!(f, "image too narrow for a page image ({width} < {min})")
            }
            PageDefect::TooWide { width, max } => {
                write!(f, "image too wide for a page image ({width} > {max})")
            }
        }
    }
}

/// Enum representing every error the segmentation pipeline can produce.
#[derive(Error, Debug)]
pub enum SegError {
    /// Wrong channel count or page dimensions outside the accepted range.
    #[error("invalid page geometry: {message}")]
    InvalidPageGeometry {
        /// Description of the offending geometry.
        message: String,
    },

    /// The page is probably white-on-black.
    #[error("image may be inverted (mean below median)")]
    LikelyInverted,

    /// The raster is constant.
    #[error("image is empty (constant intensity)")]
    EmptyImage,

    /// The scale estimate is unusable.
    #[error("bad scale ({scale})")]
    BadScale {
        /// The rejected estimate.
        scale: f32,
    },

    /// The page produced more line labels than allowed.
    #[error("too many lines: {count} > {max}")]
    TooManyLines {
        /// Number of labels found.
        count: usize,
        /// Configured limit.
        max: usize,
    },

    /// The precedes relation between lines contains a cycle.
    #[error("reading order cycle through line label {label}")]
    ReadingOrderCycle {
        /// Segmentation label of a line on the cycle.
        label: u32,
    },

    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred while encoding or saving an image.
    #[error("image save: {path}")]
    ImageSave {
        /// Destination path.
        path: String,
        /// Underlying encoder error.
        #[source]
        source: image::ImageError,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Raster shape mismatch.
    #[error("raster shape")]
    Shape(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl SegError {
    /// Creates a SegError for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a SegError for configuration errors.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a SegError for configuration errors with context.
    ///
    /// # Arguments
    ///
    /// * `field` - The field where the error occurred.
    /// * `value` - The value of the field.
    /// * `reason` - The reason for the error.
    pub fn config_error_with_context(field: &str, value: &str, reason: &str) -> Self {
        Self::ConfigError {
            message: format!(
                "Configuration error in field '{}' with value '{}': {}",
                field, value, reason
            ),
        }
    }

    /// Creates a SegError for an image that could not be written.
    pub fn image_save(path: &std::path::Path, source: image::ImageError) -> Self {
        Self::ImageSave {
            path: path.display().to_string(),
            source,
        }
    }

    /// Returns true when the error rejects a page rather than signalling a
    /// broken environment.
    pub fn is_page_rejection(&self) -> bool {
        matches!(
            self,
            SegError::InvalidPageGeometry { .. }
                | SegError::LikelyInverted
                | SegError::EmptyImage
                | SegError::BadScale { .. }
                | SegError::TooManyLines { .. }
                | SegError::ReadingOrderCycle { .. }
        )
    }

    /// The pipeline stage a page rejection belongs to.
    pub fn stage(&self) -> Option<ProcessingStage> {
        match self {
            SegError::InvalidPageGeometry { .. }
            | SegError::LikelyInverted
            | SegError::EmptyImage => Some(ProcessingStage::Binarization),
            SegError::BadScale { .. } => Some(ProcessingStage::ScaleEstimation),
            SegError::TooManyLines { .. } => Some(ProcessingStage::Segmentation),
            SegError::ReadingOrderCycle { .. } => Some(ProcessingStage::ReadingOrder),
            SegError::ImageSave { .. } => Some(ProcessingStage::Output),
            _ => None,
        }
    }
}

impl From<PageDefect> for SegError {
    fn from(defect: PageDefect) -> Self {
        match defect {
            PageDefect::Inverted => SegError::LikelyInverted,
            other => SegError::InvalidPageGeometry {
                message: other.to_string(),
            },
        }
    }
}

/// Implementation of From<image::ImageError> for SegError.
///
/// Decoder failures are the common case, so they map to [`SegError::ImageLoad`].
impl From<image::ImageError> for SegError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defect_conversion() {
        assert!(matches!(
            SegError::from(PageDefect::Inverted),
            SegError::LikelyInverted
        ));
        let err = SegError::from(PageDefect::TooShort {
            height: 400,
            min: 600,
        });
        match err {
            SegError::InvalidPageGeometry { message } => assert!(message.contains("400")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_page_rejection_classification() {
        assert!(SegError::EmptyImage.is_page_rejection());
        assert!(SegError::BadScale { scale: f32::NAN }.is_page_rejection());
        assert!(SegError::TooManyLines { count: 301, max: 300 }.is_page_rejection());
        assert!(SegError::ReadingOrderCycle { label: 3 }.is_page_rejection());
        assert!(!SegError::config_error("bad").is_page_rejection());
        assert_eq!(
            SegError::BadScale { scale: 2000.0 }.stage(),
            Some(ProcessingStage::ScaleEstimation)
        );
    }
}
