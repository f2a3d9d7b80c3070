//! Growing line seeds into a full segmentation raster.

use crate::core::errors::{SegError, SegResult};
use crate::processors::labeling::{propagate_labels, spread_labels};
use ndarray::{Array2, Zip};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Grows seed labels over the ink of `binary`.
///
/// Glyph-sized components (the boxmap) take the label of the single seed they
/// overlap and are left unlabeled on conflict. Remaining ink takes the label of
/// the nearest seed closer than `scale`. Background is always 0.
pub fn propagate_seeds(
    boxmap: &Array2<u8>,
    seeds: &Array2<u32>,
    binary: &Array2<u8>,
    scale: f32,
) -> Array2<u32> {
    let mut labels = propagate_labels(boxmap, seeds);
    let spread = spread_labels(seeds, scale);
    Zip::from(&mut labels)
        .and(&spread)
        .and(binary)
        .for_each(|l, &s, &b| {
            *l = if b == 0 {
                0
            } else if *l > 0 {
                *l
            } else {
                s
            };
        });
    labels
}

/// Distinct positive labels of a raster, ascending.
pub fn distinct_labels(labels: &Array2<u32>) -> BTreeSet<u32> {
    labels.iter().copied().filter(|&l| l > 0).collect()
}

/// Rejects segmentations with more than `maxlines` distinct labels.
///
/// # Returns
///
/// The number of distinct labels.
pub fn check_line_count(labels: &Array2<u32>, maxlines: usize) -> SegResult<usize> {
    let count = distinct_labels(labels).len();
    if count > maxlines {
        warn!("too many lines: {count} > {maxlines}");
        return Err(SegError::TooManyLines {
            count,
            max: maxlines,
        });
    }
    debug!("segmentation: {count} labels");
    Ok(count)
}
