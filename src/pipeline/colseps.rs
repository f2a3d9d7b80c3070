//! Column separator detection.
//!
//! Whitespace separators are tall vertical gaps bordered on the right by a
//! column's left edge. Black separators (vertical rules) are optional and are
//! cut out of the binary page once found.

use crate::core::config::ColumnConfig;
use crate::core::debug::{DebugArtifact, DebugSink, as_plane};
use crate::processors::filters::{amax, gaussian_filter, maximum_filter, uniform_filter};
use crate::processors::labeling::{label, select_regions};
use crate::processors::morphology::{dilation, erosion, opening};
use ndarray::{Array2, Zip};
use tracing::debug;

/// Separator mask plus the binary page with black separators removed.
#[derive(Debug, Clone)]
pub struct ColumnSeparators {
    /// 1 marks pixels line labels must not cross.
    pub colseps: Array2<u8>,
    /// Input page minus detected black separators; a subset of the input.
    pub binary: Array2<u8>,
}

/// Finds whitespace column separators.
///
/// At most `maxcolseps` regions are returned, the tallest first, each taller
/// than `csminheight * scale`.
pub fn compute_colseps_conv(binary: &Array2<u8>, scale: f32, config: &ColumnConfig) -> Array2<u8> {
    let image = binary.mapv(|v| v as f32);
    let sigma = (scale, scale * 0.5);

    let smoothed = gaussian_filter(&image, sigma, (0, 0));
    let smoothed = uniform_filter(&smoothed, ((5.0 * scale) as usize, 1));
    let limit = amax(&smoothed) * 0.1;
    let whitespace = smoothed.mapv(|v| (v < limit) as u8);

    let grad = gaussian_filter(&image, sigma, (0, 1));
    let grad = uniform_filter(&grad, ((10.0 * scale) as usize, 1));
    let limit = amax(&grad) * 0.5;
    let edges = grad.mapv(|v| (v > limit) as u8);

    let near_edges = maximum_filter(&edges, (scale as usize, (5.0 * scale) as usize));
    let mut seps = whitespace;
    Zip::from(&mut seps)
        .and(&near_edges)
        .for_each(|s, &e| *s = (*s).min(e));
    let seps = maximum_filter(&seps, ((2.0 * scale) as usize, 1));

    select_regions(
        &seps,
        |b| b.height() as f32,
        config.csminheight * scale,
        config.maxcolseps,
    )
}

/// Finds black vertical separators (rules).
///
/// The page is thickened, opened with a tall vertical bar and thinned again;
/// the `2 * maxseps` widest survivors are filtered down to the `maxseps`
/// tallest ones exceeding `20 * scale` rows.
pub fn compute_separators_morph(
    binary: &Array2<u8>,
    scale: f32,
    config: &ColumnConfig,
) -> Array2<u8> {
    let d0 = (scale / 4.0).max(5.0) as usize;
    let d1 = scale.max(5.0) as usize + config.sepwiden;
    let thick = dilation(binary, (d0, d1));
    let vert = opening(&thick, ((10.0 * scale) as usize, 1));
    let vert = erosion(&vert, (d0 / 2, config.sepwiden));
    let vert = select_regions(&vert, |b| b.width() as f32, 3.0, 2 * config.maxseps);
    select_regions(
        &vert,
        |b| b.height() as f32,
        20.0 * scale,
        config.maxseps,
    )
}

/// Computes the separator mask and removes black separators from the page.
pub fn compute_colseps(
    binary: &Array2<u8>,
    scale: f32,
    config: &ColumnConfig,
    debug: &dyn DebugSink,
) -> ColumnSeparators {
    let mut colseps = compute_colseps_conv(binary, scale, config);
    let mut binary = binary.clone();
    if config.maxseps > 0 {
        let seps = compute_separators_morph(&binary, scale, config);
        if debug.enabled() {
            debug.save("seps", DebugArtifact::Gray(as_plane(&seps).view()));
        }
        Zip::from(&mut colseps)
            .and(&mut binary)
            .and(&seps)
            .for_each(|c, b, &s| {
                *c = (*c).max(s);
                if s != 0 {
                    *b = 0;
                }
            });
    }
    if debug.enabled() {
        debug.save("colseps", DebugArtifact::Gray(as_plane(&colseps).view()));
    }
    debug!("colseps: {} regions", label(&colseps).1);
    ColumnSeparators { colseps, binary }
}
