//! Vertical gradient maps marking text-line tops and bottoms.

use crate::core::config::LineConfig;
use crate::core::debug::{DebugArtifact, DebugSink, as_plane};
use crate::pipeline::scale::{binary_objects, box_size};
use crate::processors::filters::{gaussian_filter, norm_max, uniform_filter};
use ndarray::{Array2, Zip};

/// Line-edge likelihoods and the cleaning mask they were computed from.
#[derive(Debug, Clone)]
pub struct GradientMaps {
    /// Likelihood of a line's lower edge, in [0, 1].
    pub bottom: Array2<f32>,
    /// Likelihood of a line's upper edge, in [0, 1].
    pub top: Array2<f32>,
    /// Bounding boxes of glyph-sized components.
    pub boxmap: Array2<u8>,
}

/// Fills the bounding box of every component whose [`box_size`] lies within
/// `range` (in units of `scale`).
pub fn compute_boxmap(binary: &Array2<u8>, scale: f32, range: (f32, f32)) -> Array2<u8> {
    let (lo, hi) = (range.0 * scale, range.1 * scale);
    let mut boxmap = Array2::<u8>::zeros(binary.dim());
    for b in binary_objects(binary) {
        let size = box_size(&b);
        if size < lo || size > hi {
            continue;
        }
        b.view_mut(&mut boxmap).fill(1);
    }
    boxmap
}

/// Computes the bottom and top gradient maps of a binary page.
pub fn compute_gradmaps(
    binary: &Array2<u8>,
    scale: f32,
    config: &LineConfig,
    debug: &dyn DebugSink,
) -> GradientMaps {
    let boxmap = compute_boxmap(binary, scale, config.boxmap_range);
    let mut cleaned = Array2::<f32>::zeros(binary.dim());
    Zip::from(&mut cleaned)
        .and(&boxmap)
        .and(binary)
        .for_each(|c, &m, &b| *c = (m & b) as f32);

    let (vscale, hscale) = (config.vscale, config.hscale);
    let grad = if config.usegauss {
        gaussian_filter(
            &cleaned,
            (0.3 * vscale * scale, 6.0 * hscale * scale),
            (1, 0),
        )
    } else {
        let grad = gaussian_filter(
            &cleaned,
            ((0.3 * vscale * scale).max(4.0), hscale * scale),
            (1, 0),
        );
        uniform_filter(&grad, (vscale as usize, (6.0 * hscale * scale) as usize))
    };

    let bottom = norm_max(grad.mapv(|g| (-g).max(0.0)));
    let top = norm_max(grad.mapv(|g| g.max(0.0)));
    if debug.enabled() {
        debug.save("boxmap", DebugArtifact::Gray(as_plane(&boxmap).view()));
        debug.save(
            "gradmaps",
            DebugArtifact::Rgb([bottom.view(), top.view(), cleaned.view()]),
        );
    }
    GradientMaps {
        bottom,
        top,
        boxmap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::debug::NoopSink;
    use ndarray::s;

    fn glyph_row() -> Array2<u8> {
        let mut binary = Array2::<u8>::zeros((120, 300));
        for g in 0..12 {
            let x = 40 + g * 18;
            binary.slice_mut(s![50..70, x..x + 14]).fill(1);
        }
        binary
    }

    #[test]
    fn test_boxmap_selects_glyph_sizes() {
        let mut binary = glyph_row();
        binary[[5, 5]] = 1; // speck
        binary.slice_mut(s![90..118, 10..290]).fill(1); // oversized block
        let boxmap = compute_boxmap(&binary, 16.0, (0.5, 4.0));
        assert_eq!(boxmap[[60, 45]], 1);
        assert_eq!(boxmap[[5, 5]], 0);
        assert_eq!(boxmap[[100, 100]], 0);
    }

    #[test]
    fn test_gradients_mark_line_edges() {
        let binary = glyph_row();
        let maps = compute_gradmaps(&binary, 16.0, &LineConfig::default(), &NoopSink);
        let column = 150;
        let argmax = |plane: &Array2<f32>| {
            (0..plane.nrows())
                .max_by(|&a, &b| plane[[a, column]].total_cmp(&plane[[b, column]]))
                .unwrap_or(0)
        };
        let bottom = argmax(&maps.bottom);
        let top = argmax(&maps.top);
        assert!((68..=71).contains(&bottom), "bottom edge at {bottom}");
        assert!((48..=51).contains(&top), "top edge at {top}");
        assert!(maps.bottom.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!((maps.top.iter().copied().fold(0.0f32, f32::max) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_usegauss_variant() {
        let binary = glyph_row();
        let config = LineConfig {
            usegauss: true,
            ..Default::default()
        };
        let maps = compute_gradmaps(&binary, 16.0, &config, &NoopSink);
        assert!(maps.bottom[[70, 150]] > 0.5);
        assert!(maps.top[[70, 150]] == 0.0);
    }
}
