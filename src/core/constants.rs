//! Constants used throughout the segmentation pipeline.
//!
//! Most scale-relative tunables live in [`crate::core::config`]; the values here
//! are the defaults those configs start from plus a few fixed conventions.

/// Base of the text-line label namespace.
///
/// Line `i` (1-based, in reading order) carries the segmentation label
/// `LINE_LABEL_BASE + i`. Other label spaces overlaid on a page must stay below
/// this value.
pub const LINE_LABEL_BASE: u32 = 0x010000;

/// Largest line index representable inside the line label namespace.
pub const MAX_LINE_INDEX: u32 = 0xffff;

/// The default maximum number of text lines per page.
pub const DEFAULT_MAX_LINES: usize = 300;

/// Components smaller than this many pixels are removed before line extraction.
pub const DEFAULT_NOISE: usize = 8;

/// The default padding around extracted lines.
pub const DEFAULT_PAD: usize = 3;

/// The default mask expansion for extracted lines.
pub const DEFAULT_EXPAND: usize = 3;

/// The default minimum page side in pixels.
pub const DEFAULT_MIN_PAGE_SIZE: usize = 600;

/// The default maximum page side in pixels.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 10000;

/// Scale estimates at or above this value reject the page.
pub const DEFAULT_MAX_SCALE: f32 = 1000.0;

/// Kernel radius for Gaussian filters, in standard deviations.
pub const GAUSSIAN_TRUNCATE: f32 = 4.0;
