//! The page segmentation pipeline.
//!
//! Each stage lives in its own module and consumes the previous stage's
//! rasters:
//!
//! 1. [`binarize`] normalizes, flattens and thresholds the raw page
//! 2. [`scale`] estimates the typographic scale
//! 3. [`hlines`] removes horizontal rules
//! 4. [`colseps`] finds column separators
//! 5. [`gradmaps`] computes line top/bottom gradient maps
//! 6. [`seeds`] places one seed per text line
//! 7. [`propagate`] grows the seeds over the page's ink
//! 8. [`reading_order`] sorts and relabels the lines
//! 9. [`extract`] cuts the lines out of the cleaned page
//!
//! [`PageSegmenter`] chains the stages for one page and [`BatchRunner`] runs
//! it over many pages in parallel.

pub mod batch;
pub mod binarize;
pub mod colseps;
pub mod extract;
pub mod gradmaps;
pub mod hlines;
pub mod propagate;
pub mod reading_order;
pub mod scale;
pub mod seeds;
pub mod segmenter;

pub use batch::{BatchRunner, BatchStats, PageReport};
pub use binarize::{BinarizedPage, Binarizer};
pub use extract::ExtractedLine;
pub use reading_order::LineCandidate;
pub use segmenter::{PageSegmentation, PageSegmenter};
