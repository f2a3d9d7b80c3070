//! Raster primitives shared by the pipeline stages.
//!
//! # Modules
//!
//! * `filters` - Separable Gaussian, box, rank and percentile filters plus zoom shapes
//! * `geometry` - Half-open bounding boxes and their spatial relations
//! * `labeling` - Connected components, region selection and label propagation
//! * `morphology` - Binary dilation, erosion and opening
//! * `stats` - Percentiles and fractions over samples

pub mod filters;
pub mod geometry;
pub mod labeling;
pub mod morphology;
pub mod stats;

pub use geometry::Bounds;
