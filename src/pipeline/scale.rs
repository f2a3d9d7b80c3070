//! Typographic scale estimation.

use crate::core::config::ScaleConfig;
use crate::core::errors::{SegError, SegResult};
use crate::processors::geometry::Bounds;
use crate::processors::labeling::{find_objects, label};
use crate::processors::stats::median;
use ndarray::Array2;
use tracing::{info, warn};

/// Bounding boxes of the connected components of `binary`, smallest area first.
///
/// Components of equal area keep their labeling order.
pub fn binary_objects(binary: &Array2<u8>) -> Vec<Bounds> {
    let (labels, count) = label(binary);
    let mut objects: Vec<Bounds> = find_objects(&labels, count).into_iter().flatten().collect();
    objects.sort_by_key(Bounds::area);
    objects
}

/// Side of the square with the same area as `b`.
#[inline]
pub fn box_size(b: &Bounds) -> f32 {
    (b.area() as f32).sqrt()
}

/// Estimates the dominant component size of a binary page.
///
/// Component boxes are painted smallest first with their [`box_size`], skipping
/// boxes that overlap an already painted one; the scale is the median painted
/// value inside the open `scale_range`.
///
/// # Errors
///
/// Returns `SegError::BadScale` when no component falls inside the range or
/// the estimate reaches `max_scale`.
pub fn estimate_scale(binary: &Array2<u8>, config: &ScaleConfig) -> SegResult<f32> {
    let mut scalemap = Array2::<f32>::zeros(binary.dim());
    for b in binary_objects(binary) {
        let mut region = b.view_mut(&mut scalemap);
        if region.iter().any(|&v| v > 0.0) {
            continue;
        }
        region.fill(box_size(&b));
    }

    let (lo, hi) = config.scale_range;
    let mut samples: Vec<f32> = scalemap
        .iter()
        .copied()
        .filter(|&v| v > lo && v < hi)
        .collect();
    let scale = median(&mut samples).unwrap_or(f32::NAN);
    if !scale.is_finite() || scale <= 0.0 || scale >= config.max_scale {
        warn!("bad scale ({scale}); rejecting page");
        return Err(SegError::BadScale { scale });
    }
    info!("scale {scale:.2}");
    Ok(scale)
}
