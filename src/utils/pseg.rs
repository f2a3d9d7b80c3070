//! RGB encoding of segmentation rasters.
//!
//! A label `l` is stored as the color `(l >> 16, l >> 8, l) & 0xff`; background
//! is stored as white so the file stays readable as an image. Decoding maps
//! white back to 0.

use crate::core::constants::{LINE_LABEL_BASE, MAX_LINE_INDEX};
use crate::core::errors::{SegError, SegResult};
use crate::domain::LineLabel;
use crate::processors::geometry::Bounds;
use image::{Rgb, RgbImage};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::path::Path;

const WHITE: u32 = 0xffffff;

/// Encodes a label raster as an RGB image.
pub fn encode_segmentation(labels: &Array2<u32>) -> RgbImage {
    let (h, w) = labels.dim();
    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let l = match labels[[y as usize, x as usize]] {
            0 => WHITE,
            l => l & WHITE,
        };
        Rgb([(l >> 16) as u8, (l >> 8) as u8, l as u8])
    })
}

/// Decodes an RGB segmentation image into a label raster.
pub fn decode_segmentation(img: &RgbImage) -> Array2<u32> {
    let (w, h) = img.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        let Rgb([r, g, b]) = *img.get_pixel(x as u32, y as u32);
        match (r as u32) << 16 | (g as u32) << 8 | b as u32 {
            WHITE => 0,
            l => l,
        }
    })
}

/// Reads a segmentation image from disk.
pub fn read_segmentation(path: &Path) -> SegResult<Array2<u32>> {
    let img = image::open(path).map_err(SegError::ImageLoad)?;
    Ok(decode_segmentation(&img.to_rgb8()))
}

/// Text lines present in a label raster, as `(label, bounds)` in reading order.
///
/// Labels outside the line namespace are skipped.
pub fn line_regions(labels: &Array2<u32>) -> Vec<(LineLabel, Bounds)> {
    let mut regions: BTreeMap<u32, Bounds> = BTreeMap::new();
    for ((y, x), &l) in labels.indexed_iter() {
        if l <= LINE_LABEL_BASE || l > LINE_LABEL_BASE + MAX_LINE_INDEX {
            continue;
        }
        regions
            .entry(l)
            .and_modify(|b| b.include(y, x))
            .or_insert_with(|| Bounds::pixel(y, x));
    }
    regions
        .into_iter()
        .filter_map(|(l, b)| LineLabel::from_raw(l).map(|label| (label, b)))
        .collect()
}
