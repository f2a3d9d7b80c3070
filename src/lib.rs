//! # OAR Page Segmentation
//!
//! A Rust library that turns scanned document pages into text lines. A raw
//! gray page is binarized, split into columns and lines, and the lines are
//! put into reading order and cut out as individual rasters.
//!
//! ## Features
//!
//! - Adaptive binarization with illumination flattening
//! - Typographic scale estimation from connected components
//! - Horizontal rule removal and column separator detection
//! - Gradient-based text line seeds grown into a full segmentation
//! - Column-aware reading order
//! - Line extraction with noise removal and mask expansion
//! - Parallel batch processing
//!
//! ## Modules
//!
//! * [`core`] - Configuration, error handling, constants and debug sinks
//! * [`domain`] - Text lines, line labels and the page segmentation
//! * [`pipeline`] - The segmentation stages and their drivers
//! * [`processors`] - Raster filters, labeling and morphology
//! * [`utils`] - Image conversion, artifact writing and overlays
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oar_pageseg::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let segmenter = PageSegmenter::new(SegmentationConfig::default())?;
//! let result = segmenter.segment_file(Path::new("page.png"))?;
//! println!("scale {:.1}, {} lines", result.scale, result.line_count());
//!
//! for line in segmenter.extract_lines(&result) {
//!     println!("{} at {:?}", line.label, line.region);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### TOML Configuration
//!
//! ```rust,no_run
//! use oar_pageseg::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load_from_string(r#"
//! reading_order = "RowMajor"
//!
//! [columns]
//! maxcolseps = 2
//!
//! [extract]
//! gray = true
//! "#, ConfigFormat::Toml)?;
//!
//! let segmenter = PageSegmenter::new(config)?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod core;
pub mod domain;

pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use oar_pageseg::prelude::*;
/// ```
///
/// Included items focus on the most common tasks:
/// - Configuration (`SegmentationConfig`, `ConfigLoader`, `ConfigFormat`)
/// - Segmentation (`PageSegmenter`, `PageSegmentation`, `BatchRunner`)
/// - Results (`Segmentation`, `TextLine`, `LineLabel`, `ExtractedLine`)
/// - Essential error and result types (`SegError`, `SegResult`)
pub mod prelude {
    // Configuration
    pub use crate::core::{ConfigFormat, ConfigLoader, ReadingOrderMode, SegmentationConfig};

    // Pipeline
    pub use crate::pipeline::{
        BatchRunner, ExtractedLine, PageReport, PageSegmentation, PageSegmenter,
    };

    // Results
    pub use crate::domain::{LineBounds, LineLabel, Segmentation, TextLine};

    // Error Handling (essential)
    pub use crate::core::{SegError, SegResult};

    // Image Utility (minimal)
    pub use crate::utils::{PageWriter, load_page_raster};
}
