//! Connected-component labeling and label transfer between rasters.
//!
//! Labels are dense `u32` values `1..=count` assigned in raster order of each
//! component's first pixel; 0 is background. Connectivity is 4-neighbour
//! throughout.

use crate::processors::geometry::Bounds;
use crate::utils::image::mask_to_luma;
use image::Luma;
use imageproc::region_labelling::{Connectivity, connected_components};
use ndarray::Array2;

/// Labels the connected components of the nonzero pixels of `mask`.
///
/// # Returns
///
/// The label raster and the number of components.
pub fn label(mask: &Array2<u8>) -> (Array2<u32>, usize) {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return (Array2::zeros((h, w)), 0);
    }
    let raw = connected_components(&mask_to_luma(mask), Connectivity::Four, Luma([0u8]));

    let mut remap: Vec<u32> = Vec::new();
    let mut count = 0u32;
    let labels = Array2::from_shape_fn((h, w), |(y, x)| {
        let provisional = raw.get_pixel(x as u32, y as u32)[0] as usize;
        if provisional == 0 {
            return 0;
        }
        if provisional >= remap.len() {
            remap.resize(provisional + 1, 0);
        }
        if remap[provisional] == 0 {
            count += 1;
            remap[provisional] = count;
        }
        remap[provisional]
    });
    (labels, count as usize)
}

/// Bounding boxes of labels `1..=count`; entry `i` describes label `i + 1`.
///
/// Labels absent from the raster yield `None`; labels above `count` are ignored.
pub fn find_objects(labels: &Array2<u32>, count: usize) -> Vec<Option<Bounds>> {
    let mut objects: Vec<Option<Bounds>> = vec![None; count];
    for ((y, x), &l) in labels.indexed_iter() {
        let l = l as usize;
        if l == 0 || l > count {
            continue;
        }
        match &mut objects[l - 1] {
            Some(b) => b.include(y, x),
            slot @ None => *slot = Some(Bounds::pixel(y, x)),
        }
    }
    objects
}

/// Pixel count of labels `1..=count`; entry `i` describes label `i + 1`.
pub fn component_sizes(labels: &Array2<u32>, count: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; count];
    for &l in labels {
        let l = l as usize;
        if l > 0 && l <= count {
            sizes[l - 1] += 1;
        }
    }
    sizes
}

/// Keeps the components of `mask` whose score exceeds `min`, limited to the
/// `nbest` highest-scoring ones.
///
/// # Arguments
///
/// * `mask` - Binary raster whose components are scored.
/// * `score` - Scoring function over component bounds.
/// * `min` - Exclusive lower bound on accepted scores.
/// * `nbest` - Maximum number of components kept.
///
/// # Returns
///
/// A binary raster holding only the selected components.
pub fn select_regions<F>(mask: &Array2<u8>, score: F, min: f32, nbest: usize) -> Array2<u8>
where
    F: Fn(&Bounds) -> f32,
{
    let (labels, count) = label(mask);
    let objects = find_objects(&labels, count);
    let mut scored: Vec<(usize, f32)> = objects
        .iter()
        .enumerate()
        .filter_map(|(i, b)| b.as_ref().map(|b| (i, score(b))))
        .collect();
    // highest first, earlier components win ties
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut keep = vec![false; count + 1];
    for &(i, s) in scored.iter().take(nbest) {
        if s > min {
            keep[i + 1] = true;
        }
    }
    labels.mapv(|l| keep[l as usize] as u8)
}

/// Zeroes every component of `mask` for which `drop` returns true.
pub fn filter_components<F>(mask: &Array2<u8>, drop: F) -> Array2<u8>
where
    F: Fn(&Bounds, usize) -> bool,
{
    let (labels, count) = label(mask);
    let objects = find_objects(&labels, count);
    let sizes = component_sizes(&labels, count);
    let mut keep = vec![false; count + 1];
    for (i, b) in objects.iter().enumerate() {
        if let Some(b) = b {
            keep[i + 1] = !drop(b, sizes[i]);
        }
    }
    labels.mapv(|l| keep[l as usize] as u8)
}

/// Removes components with fewer than `min_size` pixels.
pub fn remove_noise(mask: &Array2<u8>, min_size: usize) -> Array2<u8> {
    if min_size == 0 {
        return mask.mapv(|v| (v != 0) as u8);
    }
    filter_components(mask, |_, size| size < min_size)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Claim {
    Unclaimed,
    Seed(u32),
    Conflict,
}

/// Transfers seed labels onto the components of `mask`.
///
/// A component overlapping exactly one nonzero seed label takes that label.
/// Components touching no seed, or seeds of different labels, stay 0.
pub fn propagate_labels(mask: &Array2<u8>, seeds: &Array2<u32>) -> Array2<u32> {
    let (components, count) = label(mask);
    let mut claims = vec![Claim::Unclaimed; count + 1];
    for (&c, &s) in components.iter().zip(seeds.iter()) {
        if c == 0 || s == 0 {
            continue;
        }
        let claim = &mut claims[c as usize];
        *claim = match *claim {
            Claim::Unclaimed => Claim::Seed(s),
            Claim::Seed(prev) if prev == s => Claim::Seed(s),
            _ => Claim::Conflict,
        };
    }
    components.mapv(|c| match claims[c as usize] {
        Claim::Seed(s) => s,
        _ => 0,
    })
}

/// Lower envelope of the parabolas `(x - q)^2 + f[q]` over finite `f[q]`.
///
/// Writes the minimum value and its minimizing `q` for every `x`; returns false
/// when `f` holds no finite sample.
fn lower_envelope(f: &[f64], dist: &mut [f64], arg: &mut [usize]) -> bool {
    let sites: Vec<usize> = (0..f.len()).filter(|&q| f[q].is_finite()).collect();
    let Some(&first) = sites.first() else {
        return false;
    };
    let mut v = vec![first; sites.len()];
    let mut z = vec![f64::INFINITY; sites.len() + 1];
    z[0] = f64::NEG_INFINITY;
    let mut k = 0usize;
    let key = |q: usize| f[q] + (q * q) as f64;
    for &q in &sites[1..] {
        let mut s;
        loop {
            let p = v[k];
            s = (key(q) - key(p)) / (2.0 * (q as f64 - p as f64));
            if s <= z[k] {
                k -= 1;
            } else {
                break;
            }
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }
    k = 0;
    for x in 0..f.len() {
        while z[k + 1] < x as f64 {
            k += 1;
        }
        let q = v[k];
        let dx = x as f64 - q as f64;
        dist[x] = dx * dx + f[q];
        arg[x] = q;
    }
    true
}

/// Assigns every pixel the label of its nearest seed pixel (exact Euclidean
/// distance) when that distance is below `max_dist`, else 0.
pub fn spread_labels(seeds: &Array2<u32>, max_dist: f32) -> Array2<u32> {
    let (h, w) = seeds.dim();
    let mut spread = Array2::<u32>::zeros((h, w));
    if h == 0 || w == 0 {
        return spread;
    }

    // nearest seed row within each column
    let mut nearest_row = Array2::<usize>::from_elem((h, w), usize::MAX);
    for x in 0..w {
        let mut last = None;
        for y in 0..h {
            if seeds[[y, x]] != 0 {
                last = Some(y);
            }
            if let Some(ly) = last {
                nearest_row[[y, x]] = ly;
            }
        }
        let mut next = None;
        for y in (0..h).rev() {
            if seeds[[y, x]] != 0 {
                next = Some(y);
            }
            if let Some(ny) = next {
                let current = nearest_row[[y, x]];
                if current == usize::MAX || ny - y < y - current {
                    nearest_row[[y, x]] = ny;
                }
            }
        }
    }

    let limit = (max_dist as f64) * (max_dist as f64);
    let mut f = vec![0f64; w];
    let mut dist = vec![0f64; w];
    let mut arg = vec![0usize; w];
    for y in 0..h {
        for x in 0..w {
            let r = nearest_row[[y, x]];
            f[x] = if r == usize::MAX {
                f64::INFINITY
            } else {
                let dy = y as f64 - r as f64;
                dy * dy
            };
        }
        if !lower_envelope(&f, &mut dist, &mut arg) {
            break;
        }
        for x in 0..w {
            if dist[x] < limit {
                let q = arg[x];
                spread[[y, x]] = seeds[[nearest_row[[y, q]], q]];
            }
        }
    }
    spread
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_label_four_connectivity() {
        let mask = array![
            [1u8, 1, 0, 0],
            [0, 0, 1, 0],
            [0, 0, 1, 0],
            [1, 0, 0, 1]
        ];
        let (labels, n) = label(&mask);
        // the diagonal neighbours are separate components
        assert_eq!(n, 4);
        assert_eq!(labels[[0, 0]], 1);
        assert_eq!(labels[[0, 1]], 1);
        assert_eq!(labels[[1, 2]], 2);
        assert_eq!(labels[[2, 2]], 2);
        assert_eq!(labels[[3, 0]], 3);
        assert_eq!(labels[[3, 3]], 4);
        assert_eq!(labels[[1, 0]], 0);
    }

    #[test]
    fn test_label_empty() {
        let (labels, n) = label(&Array2::<u8>::zeros((3, 3)));
        assert_eq!(n, 0);
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_find_objects_and_sizes() {
        let labels = array![[1u32, 1, 0], [0, 0, 2], [0, 2, 2]];
        let objects = find_objects(&labels, 3);
        assert_eq!(objects[0], Some(Bounds::new(0, 0, 1, 2)));
        assert_eq!(objects[1], Some(Bounds::new(1, 1, 3, 3)));
        assert_eq!(objects[2], None);
        assert_eq!(component_sizes(&labels, 2), vec![2, 3]);
    }

    #[test]
    fn test_select_regions_keeps_best() {
        let mut mask = Array2::<u8>::zeros((10, 12));
        mask.slice_mut(ndarray::s![0..6, 0..1]).fill(1); // height 6
        mask.slice_mut(ndarray::s![0..4, 3..4]).fill(1); // height 4
        mask.slice_mut(ndarray::s![0..2, 6..7]).fill(1); // height 2
        mask.slice_mut(ndarray::s![0..9, 9..10]).fill(1); // height 9
        let kept = select_regions(&mask, |b| b.height() as f32, 3.0, 2);
        assert_eq!(kept[[0, 9]], 1);
        assert_eq!(kept[[0, 0]], 1);
        assert_eq!(kept[[0, 3]], 0);
        assert_eq!(kept[[0, 6]], 0);

        let none = select_regions(&mask, |b| b.height() as f32, 10.0, 5);
        assert!(none.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_remove_noise_drops_specks() {
        let mut mask = Array2::<u8>::zeros((20, 20));
        mask.slice_mut(ndarray::s![2..4, 2..4]).fill(1);
        mask.slice_mut(ndarray::s![8..16, 5..15]).fill(1);
        let cleaned = remove_noise(&mask, 8);
        assert_eq!(cleaned[[2, 2]], 0);
        assert_eq!(cleaned.iter().map(|&v| v as usize).sum::<usize>(), 80);
    }

    #[test]
    fn test_propagate_labels_conflict_drops() {
        let mask = array![
            [1u8, 1, 1, 0, 1, 1],
            [0, 0, 0, 0, 0, 0],
            [1, 1, 1, 0, 1, 1]
        ];
        let seeds = array![
            [0u32, 7, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0],
            [3, 0, 4, 0, 0, 0]
        ];
        let out = propagate_labels(&mask, &seeds);
        // single seed: inherited by the whole component
        assert_eq!(out.row(0).to_vec(), vec![7, 7, 7, 0, 0, 0]);
        // two different seeds: dropped
        assert_eq!(out.row(2).to_vec(), vec![0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_spread_labels_nearest_and_bounded() {
        let mut seeds = Array2::<u32>::zeros((5, 11));
        seeds[[2, 1]] = 5;
        seeds[[2, 9]] = 6;
        let spread = spread_labels(&seeds, 3.0);
        assert_eq!(spread[[2, 3]], 5);
        assert_eq!(spread[[2, 7]], 6);
        assert_eq!(spread[[0, 1]], 5);
        // distance 4 from both seeds
        assert_eq!(spread[[2, 5]], 0);
        // sqrt(8) < 3
        assert_eq!(spread[[0, 3]], 5);
        // sqrt(13) > 3
        assert_eq!(spread[[0, 4]], 0);
    }

    #[test]
    fn test_spread_labels_no_seeds() {
        let spread = spread_labels(&Array2::<u32>::zeros((4, 4)), 10.0);
        assert!(spread.iter().all(|&l| l == 0));
    }
}
