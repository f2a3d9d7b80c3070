//! Conversions between `image` buffers and `ndarray` rasters.
//!
//! Rasters are indexed `[row, column]`; images are addressed `(x, y)`. Gray
//! rasters hold `f32` in [0, 1] with 1 = white paper, binary rasters hold `u8`
//! with 1 = ink.

use crate::core::errors::{SegError, SegResult};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use ndarray::{Array2, ArrayView2};
use std::path::Path;

/// Converts a decoded image of any pixel type to a luma raster in [0, 1].
///
/// # Arguments
///
/// * `img` - The decoded image; color images are reduced to luma.
///
/// # Returns
///
/// * `Array2<f32>` - A `(height, width)` raster
pub fn dynamic_to_raster(img: &DynamicImage) -> Array2<f32> {
    let luma = img.to_luma32f();
    let (w, h) = luma.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        luma.get_pixel(x as u32, y as u32)[0].clamp(0.0, 1.0)
    })
}

/// Loads a page image and converts it to a luma raster in [0, 1].
///
/// # Errors
///
/// Returns `SegError::ImageLoad` if the file cannot be opened or decoded.
pub fn load_page_raster(path: &Path) -> SegResult<Array2<f32>> {
    let img = image::open(path).map_err(SegError::ImageLoad)?;
    Ok(dynamic_to_raster(&img))
}

/// Converts an 8-bit gray image to a raster in [0, 1].
pub fn gray_to_raster(img: &GrayImage) -> Array2<f32> {
    let (w, h) = img.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        img.get_pixel(x as u32, y as u32)[0] as f32 / 255.0
    })
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn positive_max(plane: &ArrayView2<'_, f32>) -> f32 {
    plane
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f32, f32::max)
}

/// Renders a float raster as an 8-bit gray image.
///
/// With `normalize` the raster is divided by its maximum first; negative and
/// out-of-range values are clipped either way.
pub fn float_to_gray(plane: ArrayView2<'_, f32>, normalize: bool) -> GrayImage {
    let (h, w) = plane.dim();
    let max = positive_max(&plane);
    let scale = if normalize && max > 0.0 { 1.0 / max } else { 1.0 };
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([to_byte(plane[[y as usize, x as usize]] * scale)])
    })
}

/// Combines three planes into an RGB image, each normalized by its own maximum.
pub fn rgb_from_planes(planes: [ArrayView2<'_, f32>; 3]) -> RgbImage {
    let (h, w) = planes[0].dim();
    let scales = planes.each_ref().map(|p| {
        let max = positive_max(p);
        if max > 0.0 { 1.0 / max } else { 1.0 }
    });
    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let (y, x) = (y as usize, x as usize);
        let px = |c: usize| {
            planes[c]
                .get((y, x))
                .map_or(0, |&v| to_byte(v * scales[c]))
        };
        Rgb([px(0), px(1), px(2)])
    })
}

/// Resamples a gray raster to `(rows, cols)` with a triangle filter.
///
/// Samples are clamped to [0, 1] by the resampler.
pub fn resize_plane(plane: &Array2<f32>, shape: (usize, usize)) -> Array2<f32> {
    let (h, w) = plane.dim();
    let (oh, ow) = (shape.0.max(1), shape.1.max(1));
    if h == 0 || w == 0 {
        return Array2::zeros((oh, ow));
    }
    let src: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(w as u32, h as u32, |x, y| Luma([plane[[y as usize, x as usize]]]));
    let resized = imageops::resize(&src, ow as u32, oh as u32, FilterType::Triangle);
    Array2::from_shape_fn((oh, ow), |(y, x)| resized.get_pixel(x as u32, y as u32)[0])
}

/// Renders a binary raster as a page image: ink black, paper white.
pub fn binary_to_page_image(binary: ArrayView2<'_, u8>) -> GrayImage {
    let (h, w) = binary.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([if binary[[y as usize, x as usize]] != 0 { 0 } else { 255 }])
    })
}

/// Renders a mask with nonzero pixels as 255 for imageproc operators.
pub fn mask_to_luma(mask: &Array2<u8>) -> GrayImage {
    let (h, w) = mask.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([if mask[[y as usize, x as usize]] != 0 { 255 } else { 0 }])
    })
}

/// Reads a mask back from an imageproc result; nonzero pixels become 1.
pub fn luma_to_mask(img: &GrayImage) -> Array2<u8> {
    let (w, h) = img.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        (img.get_pixel(x as u32, y as u32)[0] > 0) as u8
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_float_to_gray_normalizes() {
        let plane = array![[0.0f32, 0.5], [2.0, -1.0]];
        let img = float_to_gray(plane.view(), true);
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 0)[0], 64);
        assert_eq!(img.get_pixel(0, 1)[0], 255);
        assert_eq!(img.get_pixel(1, 1)[0], 0);

        let raw = float_to_gray(plane.view(), false);
        assert_eq!(raw.get_pixel(1, 0)[0], 128);
    }

    #[test]
    fn test_resize_plane_round_trip() {
        let plane = Array2::from_shape_fn((40, 60), |(_, x)| x as f32 / 59.0);
        let small = resize_plane(&plane, (20, 30));
        assert_eq!(small.dim(), (20, 30));
        let back = resize_plane(&small, plane.dim());
        assert_eq!(back.dim(), (40, 60));
        // a horizontal ramp stays a ramp and stays aligned
        assert!((back[[20, 30]] - plane[[20, 30]]).abs() < 0.05);
        assert!(back[[20, 10]] < back[[20, 50]]);
        assert!(back.iter().all(|v| (0.0..=1.0).contains(v)));

        let flat = resize_plane(&Array2::from_elem((7, 9), 0.6f32), (4, 5));
        assert!(flat.iter().all(|v| (v - 0.6).abs() < 1e-5));
    }

    #[test]
    fn test_binary_page_polarity() {
        let binary = array![[1u8, 0, 0]];
        let img = binary_to_page_image(binary.view());
        assert_eq!(img.dimensions(), (3, 1));
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_mask_luma_roundtrip_orientation() {
        let mask = array![[0u8, 1, 0], [1, 0, 0]];
        let luma = mask_to_luma(&mask);
        assert_eq!(luma.dimensions(), (3, 2));
        assert_eq!(luma.get_pixel(1, 0)[0], 255);
        assert_eq!(luma_to_mask(&luma), mask);
    }

    #[test]
    fn test_load_page_raster() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        let img = GrayImage::from_fn(4, 3, |x, _| Luma([if x == 0 { 0 } else { 255 }]));
        img.save(&path).unwrap();
        let raster = load_page_raster(&path).unwrap();
        assert_eq!(raster.dim(), (3, 4));
        assert_eq!(raster[[1, 0]], 0.0);
        assert_eq!(raster[[1, 3]], 1.0);
        assert_eq!(gray_to_raster(&img), raster);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_page_raster(Path::new("/nonexistent/page.png"));
        assert!(matches!(result, Err(SegError::ImageLoad(_))));
    }
}
