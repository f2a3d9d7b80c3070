//! Page normalization, illumination flattening and thresholding.
//!
//! The binarizer turns a raw gray raster into a normalized gray page (paper
//! near 1, ink near 0) and a binary ink raster. Uneven paper shading is removed
//! by subtracting a local white-level estimate unless the page is already
//! essentially black and white.

use crate::core::config::BinarizeConfig;
use crate::core::debug::{DebugArtifact, DebugSink, as_plane};
use crate::core::errors::{PageDefect, SegError, SegResult};
use crate::processors::filters::{gaussian_filter, percentile_filter, zoomed_shape};
use crate::processors::morphology::dilation;
use crate::processors::stats::{fraction, median, percentile};
use crate::utils::image::resize_plane;
use ndarray::{Array2, ArrayView2, ArrayViewD, Axis, Ix2, Zip, s};
use tracing::{debug, info, warn};

/// Output of the binarizer.
#[derive(Debug, Clone)]
pub struct BinarizedPage {
    /// Ink raster: 1 = ink, 0 = paper.
    pub binary: Array2<u8>,
    /// Flattened page rescaled between the black and white levels, in [0, 1].
    pub normalized: Array2<f32>,
    /// Estimated black level of the flattened page.
    pub lo: f32,
    /// Estimated white level of the flattened page.
    pub hi: f32,
    /// Whether the white-level flattening ran.
    pub flattened: bool,
}

/// Rescales a raw raster to [0, 1].
///
/// # Errors
///
/// Returns `SegError::EmptyImage` for constant (or empty) rasters.
pub fn normalize_raw(raw: ArrayView2<'_, f32>) -> SegResult<Array2<f32>> {
    let (min, max) = raw
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !(max > min) || !(max - min).is_finite() {
        return Err(SegError::EmptyImage);
    }
    let range = max - min;
    Ok(raw.mapv(|v| (v - min) / range))
}

/// Sanity check of a normalized page.
///
/// Looks for a multi-channel raster, an inverted page, and dimensions outside
/// the configured page size range. The polarity test runs on the ink raster
/// (`max - image`), where a regular page has its mean above its median.
pub fn check_page(image: &ArrayViewD<'_, f32>, config: &BinarizeConfig) -> Option<PageDefect> {
    if image.ndim() != 2 {
        return Some(PageDefect::Color {
            shape: image.shape().to_vec(),
        });
    }
    let max = image.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut ink: Vec<f32> = image.iter().map(|&v| max - v).collect();
    let mean = ink.iter().map(|&v| v as f64).sum::<f64>() / ink.len().max(1) as f64;
    if let Some(med) = median(&mut ink)
        && (mean as f32) < med
    {
        return Some(PageDefect::Inverted);
    }

    let (h, w) = (image.shape()[0], image.shape()[1]);
    let (min_size, max_size) = (config.min_page_size, config.max_page_size);
    if h < min_size {
        return Some(PageDefect::TooShort {
            height: h,
            min: min_size,
        });
    }
    if h > max_size {
        return Some(PageDefect::TooTall {
            height: h,
            max: max_size,
        });
    }
    if w < min_size {
        return Some(PageDefect::TooNarrow {
            width: w,
            min: min_size,
        });
    }
    if w > max_size {
        return Some(PageDefect::TooWide {
            width: w,
            max: max_size,
        });
    }
    None
}

/// [`check_page`] on a binary ink raster, run as if it were a paper-white page.
pub fn check_binary_page(binary: &Array2<u8>, config: &BinarizeConfig) -> Option<PageDefect> {
    let page = binary.mapv(|v| if v != 0 { 0.0f32 } else { 1.0 });
    check_page(&page.view().into_dyn(), config)
}

/// Share of samples below 0.05 or above 0.95.
pub fn extreme_fraction(image: &Array2<f32>) -> f32 {
    fraction(image.iter().copied(), |v| !(0.05..=0.95).contains(&v))
}

/// Estimates the local white level and subtracts it from the page.
///
/// The page is downscaled by `zoom`, filtered with an upper percentile along
/// each axis in turn, and scaled back up to the exact original shape.
pub fn estimate_local_whitelevel(
    image: &Array2<f32>,
    zoom: f32,
    perc: f32,
    range: usize,
) -> (Array2<f32>, Array2<f32>) {
    let small = resize_plane(image, zoomed_shape(image.dim(), zoom));
    let small = percentile_filter(&small, perc, (range, 2));
    let small = percentile_filter(&small, perc, (2, range));
    let background = resize_plane(&small, image.dim());
    let mut flat = image.clone();
    Zip::from(&mut flat)
        .and(&background)
        .for_each(|f, &b| *f = (*f - b + 1.0).clamp(0.0, 1.0));
    (flat, background)
}

/// Mask of high-variance (text) areas used to sample the thresholds.
fn variance_mask(est: &Array2<f32>, escale: f32) -> Array2<u8> {
    let sigma = escale * 20.0;
    let smooth = gaussian_filter(est, (sigma, sigma), (0, 0));
    let deviation = (est - &smooth).mapv(|v| v * v);
    let v = gaussian_filter(&deviation, (sigma, sigma), (0, 0)).mapv(f32::sqrt);
    let vmax = v.iter().copied().fold(0.0f32, f32::max);
    let mask = v.mapv(|x| (x > 0.3 * vmax) as u8);
    let width = (escale * 50.0) as usize;
    let mask = dilation(&mask, (width, 1));
    dilation(&mask, (1, width))
}

/// Estimates the black and white levels of a flattened page.
///
/// Samples come from the page minus a `bignore` border, restricted to the
/// variance mask when `escale > 0`. Degenerate estimates fall back to the
/// sample range, then to `(0, 1)`.
pub fn estimate_thresholds(
    flat: &Array2<f32>,
    config: &BinarizeConfig,
    debug: &dyn DebugSink,
) -> (f32, f32) {
    let (d0, d1) = flat.dim();
    let (o0, o1) = (
        (config.bignore * d0 as f32) as usize,
        (config.bignore * d1 as f32) as usize,
    );
    let est = flat.slice(s![o0..d0 - o0, o1..d1 - o1]).to_owned();

    let mut samples: Vec<f32> = if config.escale > 0.0 {
        let mask = variance_mask(&est, config.escale);
        if debug.enabled() {
            debug.save("thresh_mask", DebugArtifact::Gray(as_plane(&mask).view()));
        }
        est.iter()
            .zip(mask.iter())
            .filter_map(|(&v, &m)| (m != 0).then_some(v))
            .collect()
    } else {
        Vec::new()
    };
    if samples.is_empty() {
        samples = est.iter().copied().collect();
    }

    let lo = percentile(&mut samples, config.lo).unwrap_or(0.0);
    let hi = percentile(&mut samples, config.hi).unwrap_or(1.0);
    if hi > lo {
        return (lo, hi);
    }
    // samples are sorted by percentile()
    let (min, max) = match (samples.first(), samples.last()) {
        (Some(&a), Some(&b)) => (a, b),
        _ => (0.0, 1.0),
    };
    if max > min {
        warn!("degenerate thresholds ({lo}, {hi}); using sample range ({min}, {max})");
        (min, max)
    } else {
        warn!("degenerate thresholds ({lo}, {hi}); using (0, 1)");
        (0.0, 1.0)
    }
}

/// Turns raw page rasters into binarized pages.
#[derive(Debug, Clone, Default)]
pub struct Binarizer {
    config: BinarizeConfig,
}

impl Binarizer {
    pub fn new(config: BinarizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BinarizeConfig {
        &self.config
    }

    /// Binarizes a raster of any dimensionality.
    ///
    /// Three-dimensional rasters are rejected as color images when the page
    /// check is enabled; otherwise their channels are averaged.
    pub fn binarize_dyn(
        &self,
        raw: ArrayViewD<'_, f32>,
        debug: &dyn DebugSink,
    ) -> SegResult<BinarizedPage> {
        match raw.ndim() {
            2 => self.binarize(raw.into_dimensionality::<Ix2>()?, debug),
            3 if !self.config.check_page => {
                let gray = raw
                    .mean_axis(Axis(2))
                    .ok_or_else(|| SegError::invalid_input("raster has no channels"))?
                    .into_dimensionality::<Ix2>()?;
                self.binarize(gray.view(), debug)
            }
            3 => Err(PageDefect::Color {
                shape: raw.shape().to_vec(),
            }
            .into()),
            n => Err(SegError::invalid_input(format!(
                "expected a 2-D or 3-D raster, got {n} dimensions"
            ))),
        }
    }

    /// Binarizes a single-channel raster.
    pub fn binarize(
        &self,
        raw: ArrayView2<'_, f32>,
        debug: &dyn DebugSink,
    ) -> SegResult<BinarizedPage> {
        let config = &self.config;
        let image = normalize_raw(raw)?;

        if config.check_page
            && let Some(defect) = check_page(&image.view().into_dyn(), config)
        {
            warn!("page rejected: {defect}");
            return Err(defect.into());
        }

        let extreme = extreme_fraction(&image);
        let flattened = extreme <= config.extreme_fraction;
        let flat = if flattened {
            let (flat, background) =
                estimate_local_whitelevel(&image, config.zoom, config.perc, config.range);
            if debug.enabled() {
                debug.save("background", DebugArtifact::Gray(background.view()));
                debug.save("flat", DebugArtifact::Gray(flat.view()));
            }
            flat
        } else {
            debug!("extreme fraction {extreme:.3}; skipping flattening");
            image
        };

        let (lo, hi) = estimate_thresholds(&flat, config, debug);
        info!("binarize: lo {lo:.3} hi {hi:.3} flattened {flattened}");

        let normalized = flat.mapv(|v| ((v - lo) / (hi - lo)).clamp(0.0, 1.0));
        let binary = normalized.mapv(|v| (v <= config.threshold) as u8);
        if debug.enabled() {
            debug.save("nrm", DebugArtifact::Gray(normalized.view()));
        }

        Ok(BinarizedPage {
            binary,
            normalized,
            lo,
            hi,
            flattened,
        })
    }
}
