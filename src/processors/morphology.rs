//! Binary morphology on `{0, 1}` rasters.

use crate::processors::filters::{maximum_filter, minimum_filter};
use crate::utils::image::{luma_to_mask, mask_to_luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use ndarray::Array2;

/// Dilates a binary mask by a Chebyshev radius, i.e. with a `(2r+1)` square.
pub fn dilate_square(mask: &Array2<u8>, radius: u8) -> Array2<u8> {
    let (h, w) = mask.dim();
    if radius == 0 || h == 0 || w == 0 {
        return mask.mapv(|v| (v != 0) as u8);
    }
    let dilated = morphology::dilate(&mask_to_luma(mask), Norm::LInf, radius);
    luma_to_mask(&dilated)
}

/// Dilation with a `(rows, cols)` rectangle.
pub fn dilation(mask: &Array2<u8>, size: (usize, usize)) -> Array2<u8> {
    maximum_filter(mask, size)
}

/// Erosion with a `(rows, cols)` rectangle; the border is reflected, not eroded.
pub fn erosion(mask: &Array2<u8>, size: (usize, usize)) -> Array2<u8> {
    minimum_filter(mask, size)
}

/// Opening (erosion then dilation) with a `(rows, cols)` rectangle.
pub fn opening(mask: &Array2<u8>, size: (usize, usize)) -> Array2<u8> {
    dilation(&erosion(mask, size), size)
}
