//! Removal of horizontal rules.

use crate::processors::labeling::filter_components;
use ndarray::Array2;
use tracing::debug;

/// Zeroes every component wider than `maxsize * scale` (rules, underlines, frames).
pub fn remove_hlines(binary: &Array2<u8>, scale: f32, maxsize: f32) -> Array2<u8> {
    let limit = maxsize * scale;
    let cleaned = filter_components(binary, |b, _| b.width() as f32 > limit);
    debug!(
        "hlines: removed {} pixels",
        binary.iter().filter(|&&v| v != 0).count() - cleaned.iter().filter(|&&v| v != 0).count()
    );
    cleaned
}
