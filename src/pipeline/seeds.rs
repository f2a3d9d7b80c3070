//! Text-line seed generation from the gradient maps.

use crate::core::config::LineConfig;
use crate::core::debug::{DebugArtifact, DebugSink, as_plane};
use crate::pipeline::gradmaps::GradientMaps;
use crate::processors::filters::{amax, maximum_filter};
use crate::processors::labeling::label;
use ndarray::{Array2, Zip};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    Top,
    Bottom,
}

/// Marks the vertical local maxima of `plane` above `threshold`, outside separators.
fn mark_edges(plane: &Array2<f32>, vrange: usize, threshold: f32, colseps: &Array2<u8>) -> Array2<u8> {
    let peaks = maximum_filter(plane, (vrange, 0));
    let mut marked = Array2::<u8>::zeros(plane.dim());
    Zip::from(&mut marked)
        .and(plane)
        .and(&peaks)
        .for_each(|m, &v, &p| *m = (v == p) as u8);
    let mut marked = maximum_filter(&marked, (2, 2));
    Zip::from(&mut marked)
        .and(plane)
        .and(colseps)
        .for_each(|m, &v, &c| {
            if v <= threshold || c != 0 {
                *m = 0;
            }
        });
    marked
}

/// Builds labeled line seeds between detected line bottoms and tops.
///
/// Each marked bottom seeds a band of `max(3, scale / 2)` rows above it; when
/// the next marked edge above is a top within `5 * scale` rows, the whole gap
/// is seeded. Seeds are widened horizontally by `1 + scale` and never cover a
/// separator.
///
/// # Returns
///
/// The seed label raster and the number of seeds.
pub fn compute_line_seeds(
    maps: &GradientMaps,
    colseps: &Array2<u8>,
    scale: f32,
    config: &LineConfig,
    debug: &dyn DebugSink,
) -> (Array2<u32>, usize) {
    let t = config.threshold;
    let vrange = (config.vscale * scale) as usize;
    let bmarked = mark_edges(&maps.bottom, vrange, t * amax(&maps.bottom), colseps);
    let tmarked = mark_edges(&maps.top, vrange, t * 0.5 * amax(&maps.top), colseps);
    let tmarked = maximum_filter(&tmarked, (1, 20));

    let (h, w) = maps.bottom.dim();
    let delta = ((scale / 2.0) as usize).max(3);
    let reach = 5.0 * scale;
    let mut seeds = Array2::<u8>::zeros((h, w));
    let mut transitions: Vec<(usize, Edge)> = Vec::new();
    for x in 0..w {
        transitions.clear();
        transitions.extend((0..h).filter(|&y| bmarked[[y, x]] != 0).map(|y| (y, Edge::Bottom)));
        transitions.extend((0..h).filter(|&y| tmarked[[y, x]] != 0).map(|y| (y, Edge::Top)));
        transitions.sort_unstable_by(|a, b| b.cmp(a));
        transitions.push((0, Edge::Top));

        for pair in transitions.windows(2) {
            let ((y0, kind), (y1, next)) = (pair[0], pair[1]);
            if kind != Edge::Bottom {
                continue;
            }
            for y in y0.saturating_sub(delta)..y0 {
                seeds[[y, x]] = 1;
            }
            if next == Edge::Top && ((y0 - y1) as f32) < reach {
                for y in y1..y0 {
                    seeds[[y, x]] = 1;
                }
            }
        }
    }

    let mut seeds = maximum_filter(&seeds, (1, (1.0 + scale) as usize));
    Zip::from(&mut seeds).and(colseps).for_each(|s, &c| {
        if c != 0 {
            *s = 0;
        }
    });
    if debug.enabled() {
        debug.save(
            "lineseeds",
            DebugArtifact::Rgb([
                as_plane(&bmarked).view(),
                as_plane(&tmarked).view(),
                as_plane(&seeds).view(),
            ]),
        );
    }
    let (labels, count) = label(&seeds);
    debug!("seeds: {count}");
    (labels, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::debug::NoopSink;
    use crate::pipeline::gradmaps::compute_gradmaps;
    use ndarray::s;

    fn glyph_rows(rows: &[usize]) -> Array2<u8> {
        let mut binary = Array2::<u8>::zeros((300, 360));
        for &y in rows {
            for g in 0..15 {
                let x = 40 + g * 18;
                binary.slice_mut(s![y..y + 20, x..x + 14]).fill(1);
            }
        }
        binary
    }

    #[test]
    fn test_one_seed_per_row() {
        let binary = glyph_rows(&[40, 140, 240]);
        let config = LineConfig::default();
        let maps = compute_gradmaps(&binary, 16.7, &config, &NoopSink);
        let colseps = Array2::<u8>::zeros(binary.dim());
        let (seeds, count) = compute_line_seeds(&maps, &colseps, 16.7, &config, &NoopSink);
        assert_eq!(count, 3);
        // each row's interior is covered by its own seed
        let ids: Vec<u32> = [50usize, 150, 250].iter().map(|&y| seeds[[y, 150]]).collect();
        assert!(ids.iter().all(|&l| l > 0));
        assert!(ids[0] != ids[1] && ids[1] != ids[2]);
        // whitespace between rows stays unseeded
        assert_eq!(seeds[[100, 150]], 0);
    }

    #[test]
    fn test_separators_split_seeds() {
        let binary = glyph_rows(&[40]);
        let config = LineConfig::default();
        let maps = compute_gradmaps(&binary, 16.7, &config, &NoopSink);
        let mut colseps = Array2::<u8>::zeros(binary.dim());
        colseps.slice_mut(s![.., 170..176]).fill(1);
        let (seeds, count) = compute_line_seeds(&maps, &colseps, 16.7, &config, &NoopSink);
        assert_eq!(count, 2);
        assert!(seeds.slice(s![.., 170..176]).iter().all(|&l| l == 0));
        assert_ne!(seeds[[50, 100]], seeds[[50, 250]]);
    }
}
