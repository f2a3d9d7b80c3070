//! Order statistics over sample sets.

/// Percentile of `values` with linear interpolation between ranks.
///
/// The slice is sorted in place. Returns `None` when it is empty.
pub fn percentile(values: &mut [f32], percentile: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let p = percentile.clamp(0.0, 100.0) as f64 / 100.0;
    let pos = p * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(values.len() - 1);
    let frac = (pos - lo as f64) as f32;
    Some(values[lo] + (values[hi] - values[lo]) * frac)
}

/// Median of `values`, averaging the two middle samples for even counts.
pub fn median(values: &mut [f32]) -> Option<f32> {
    percentile(values, 50.0)
}

/// Fraction of `values` for which `pred` holds; 0 for an empty iterator.
pub fn fraction<I, F>(values: I, pred: F) -> f32
where
    I: IntoIterator<Item = f32>,
    F: Fn(f32) -> bool,
{
    let (hits, total) = values
        .into_iter()
        .fold((0usize, 0usize), |(h, t), v| (h + pred(v) as usize, t + 1));
    if total == 0 { 0.0 } else { hits as f32 / total as f32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let mut v = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&mut v, 0.0), Some(1.0));
        assert_eq!(percentile(&mut v, 100.0), Some(4.0));
        assert_eq!(percentile(&mut v, 50.0), Some(2.5));
        let p90 = percentile(&mut v, 90.0).unwrap();
        assert!((p90 - 3.7).abs() < 1e-5);
    }

    #[test]
    fn test_median_odd_and_empty() {
        let mut v = vec![9.0, 1.0, 5.0];
        assert_eq!(median(&mut v), Some(5.0));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_fraction() {
        let values = [0.0f32, 0.5, 1.0, 1.0];
        assert_eq!(fraction(values, |v| v >= 1.0), 0.5);
        assert_eq!(fraction(Vec::<f32>::new(), |_| true), 0.0);
    }
}
