//! Separable and rank filters over 2D rasters.
//!
//! All filters use the half-sample symmetric ("reflect") boundary, i.e. the
//! signal `a b c d` is extended as `d c b a | a b c d | d c b a`. A window of
//! size `s` centred on index `i` covers `i - s/2 ..= i - s/2 + s - 1`, so even
//! windows lean towards lower indices.

use crate::core::constants::GAUSSIAN_TRUNCATE;
use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis, Zip};
use std::collections::VecDeque;

/// Maps an out-of-range index onto the signal with reflect boundary handling.
#[inline]
pub(crate) fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    if n <= 1 {
        return 0;
    }
    let m = i.rem_euclid(2 * n);
    if m < n { m as usize } else { (2 * n - 1 - m) as usize }
}

/// Copies `lane` into `buf`, padded by `before` and `after` reflected samples.
fn fill_padded<T: Copy>(lane: &ArrayView1<'_, T>, before: usize, after: usize, buf: &mut Vec<T>) {
    let n = lane.len();
    buf.clear();
    buf.extend(
        (0..n + before + after).map(|t| lane[reflect_index(t as isize - before as isize, n)]),
    );
}

/// Runs `f(input_lane, output_lane)` over every lane along `axis`.
fn map_lanes<T, U, F>(input: &Array2<T>, axis: Axis, f: F) -> Array2<U>
where
    T: Copy,
    U: Copy + Default,
    F: Fn(&ArrayView1<'_, T>, &mut ArrayViewMut1<'_, U>),
{
    let mut output = Array2::<U>::default(input.raw_dim());
    Zip::from(input.lanes(axis))
        .and(output.lanes_mut(axis))
        .for_each(|src, mut dst| f(&src, &mut dst));
    output
}

/// Builds the correlation weights of a sampled Gaussian or its first derivative.
///
/// The weights are applied as `out[i] = sum_k w[k] * in[i + k - r]`, so an
/// order-1 kernel yields a positive response on increasing signals.
pub fn gaussian_kernel(sigma: f32, order: usize) -> Vec<f32> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let s2 = (sigma as f64) * (sigma as f64);
    let phi: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / s2).exp())
        .collect();
    let total: f64 = phi.iter().sum();
    (-radius..=radius)
        .zip(phi)
        .map(|(x, p)| {
            let p = p / total;
            match order {
                0 => p as f32,
                _ => (x as f64 / s2 * p) as f32,
            }
        })
        .collect()
}

fn correlate_axis(input: &Array2<f32>, axis: Axis, weights: &[f32]) -> Array2<f32> {
    let r = weights.len() / 2;
    map_lanes(input, axis, |src, dst| {
        let mut buf = Vec::with_capacity(src.len() + 2 * r);
        fill_padded(src, r, r, &mut buf);
        for (i, out) in dst.iter_mut().enumerate() {
            *out = weights
                .iter()
                .zip(&buf[i..i + weights.len()])
                .map(|(w, v)| w * v)
                .sum();
        }
    })
}

/// Gaussian filter with per-axis standard deviation and derivative order.
///
/// `order` may be 0 (smoothing) or 1 (first derivative) on each axis. An axis
/// with zero sigma and order 0 is left untouched.
pub fn gaussian_filter(input: &Array2<f32>, sigma: (f32, f32), order: (usize, usize)) -> Array2<f32> {
    let mut output = input.clone();
    for (axis, s, o) in [(Axis(0), sigma.0, order.0), (Axis(1), sigma.1, order.1)] {
        if s <= 1e-6 {
            continue;
        }
        output = correlate_axis(&output, axis, &gaussian_kernel(s, o));
    }
    output
}

fn uniform_axis(input: &Array2<f32>, axis: Axis, size: usize) -> Array2<f32> {
    let before = size / 2;
    let after = size - 1 - before;
    map_lanes(input, axis, |src, dst| {
        let mut buf = Vec::with_capacity(src.len() + size);
        fill_padded(src, before, after, &mut buf);
        let mut prefix = Vec::with_capacity(buf.len() + 1);
        prefix.push(0.0f64);
        let mut acc = 0.0f64;
        for &v in &buf {
            acc += v as f64;
            prefix.push(acc);
        }
        for (i, out) in dst.iter_mut().enumerate() {
            *out = ((prefix[i + size] - prefix[i]) / size as f64) as f32;
        }
    })
}

/// Box (mean) filter with a `(rows, cols)` window.
pub fn uniform_filter(input: &Array2<f32>, size: (usize, usize)) -> Array2<f32> {
    let mut output = input.clone();
    for (axis, s) in [(Axis(0), size.0), (Axis(1), size.1)] {
        if s > 1 {
            output = uniform_axis(&output, axis, s);
        }
    }
    output
}

/// Sliding-window extremum along one axis; `keep_new` decides whether the new
/// sample evicts the queue tail.
fn extremum_axis<T, F>(input: &Array2<T>, axis: Axis, size: usize, keep_new: F) -> Array2<T>
where
    T: Copy + Default,
    F: Fn(T, T) -> bool + Copy,
{
    let before = size / 2;
    let after = size - 1 - before;
    map_lanes(input, axis, |src, dst| {
        let mut buf = Vec::with_capacity(src.len() + size);
        fill_padded(src, before, after, &mut buf);
        let mut window: VecDeque<usize> = VecDeque::with_capacity(size);
        let mut next = 0;
        for (i, out) in dst.iter_mut().enumerate() {
            while next < i + size {
                while let Some(&back) = window.back() {
                    if keep_new(buf[next], buf[back]) {
                        window.pop_back();
                    } else {
                        break;
                    }
                }
                window.push_back(next);
                next += 1;
            }
            while let Some(&front) = window.front() {
                if front < i {
                    window.pop_front();
                } else {
                    break;
                }
            }
            if let Some(&front) = window.front() {
                *out = buf[front];
            }
        }
    })
}

/// Maximum filter with a `(rows, cols)` rectangular window.
pub fn maximum_filter<T>(input: &Array2<T>, size: (usize, usize)) -> Array2<T>
where
    T: Copy + Default + PartialOrd,
{
    let mut output = input.clone();
    for (axis, s) in [(Axis(0), size.0), (Axis(1), size.1)] {
        if s > 1 {
            output = extremum_axis(&output, axis, s, |new, old| new >= old);
        }
    }
    output
}

/// Minimum filter with a `(rows, cols)` rectangular window.
pub fn minimum_filter<T>(input: &Array2<T>, size: (usize, usize)) -> Array2<T>
where
    T: Copy + Default + PartialOrd,
{
    let mut output = input.clone();
    for (axis, s) in [(Axis(0), size.0), (Axis(1), size.1)] {
        if s > 1 {
            output = extremum_axis(&output, axis, s, |new, old| new <= old);
        }
    }
    output
}

/// Rank filter returning the `percentile` of each `(rows, cols)` window.
///
/// The rank is `floor(percentile / 100 * window_len)`, clamped to the window.
pub fn percentile_filter(input: &Array2<f32>, percentile: f32, size: (usize, usize)) -> Array2<f32> {
    let (sy, sx) = (size.0.max(1), size.1.max(1));
    let (h, w) = input.dim();
    let count = sy * sx;
    let rank = ((percentile / 100.0 * count as f32) as usize).min(count - 1);
    let (by, bx) = ((sy / 2) as isize, (sx / 2) as isize);
    let mut window = Vec::with_capacity(count);
    Array2::from_shape_fn((h, w), |(y, x)| {
        window.clear();
        for dy in 0..sy as isize {
            let yy = reflect_index(y as isize - by + dy, h);
            for dx in 0..sx as isize {
                window.push(input[[yy, reflect_index(x as isize - bx + dx, w)]]);
            }
        }
        let (_, value, _) = window.select_nth_unstable_by(rank, |a, b| a.total_cmp(b));
        *value
    })
}

/// Shape of a raster zoomed by `factor`, never smaller than one pixel.
pub fn zoomed_shape(shape: (usize, usize), factor: f32) -> (usize, usize) {
    let z = |n: usize| ((n as f32 * factor).round() as usize).max(1);
    (z(shape.0), z(shape.1))
}

/// Divides by the maximum; rasters with a non-positive maximum are returned unchanged.
pub fn norm_max(input: Array2<f32>) -> Array2<f32> {
    let max = input.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max > 0.0 { input / max } else { input }
}

/// Largest sample of a raster, or 0 for an empty raster.
pub fn amax(input: &Array2<f32>) -> f32 {
    input.iter().copied().fold(0.0f32, |m, v| if v > m { v } else { m })
}
