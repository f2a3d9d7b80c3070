//! Utility functions for the segmentation pipeline.
//!
//! This module covers conversions between images and rasters, the on-disk
//! artifact formats, overlays, and logging setup.

pub mod image;
pub mod output;
pub mod pseg;
pub mod visualization;

pub use image::{binary_to_page_image, dynamic_to_raster, float_to_gray, load_page_raster};
pub use output::{PageWriter, WrittenArtifacts};
pub use pseg::{decode_segmentation, encode_segmentation, line_regions, read_segmentation};
pub use visualization::{OverlayConfig, draw_line_boxes};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
