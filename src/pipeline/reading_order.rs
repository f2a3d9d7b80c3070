//! Reading order of text lines.
//!
//! A pairwise "precedes" relation over line bounding boxes is sorted
//! topologically; the segmentation is then relabeled so that the `i`-th line
//! in reading order carries `LINE_LABEL_BASE + i`.

use crate::core::config::{LineConfig, ReadingOrderMode};
use crate::core::errors::{SegError, SegResult};
use crate::domain::{LineBounds, LineLabel, Segmentation, TextLine};
use crate::processors::labeling::find_objects;
use ndarray::Array2;
use std::collections::HashMap;
use tracing::debug;

/// A line before ordering: its provisional label and bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCandidate {
    /// Label in the unordered segmentation.
    pub raw: u32,
    /// Bounding box in page coordinates.
    pub bounds: LineBounds,
}

/// Collects one candidate per label, ascending by label.
///
/// Lines narrower than `min_line_width * scale` or shorter than
/// `min_line_height * scale` are skipped.
pub fn line_candidates(labels: &Array2<u32>, scale: f32, config: &LineConfig) -> Vec<LineCandidate> {
    let max_label = labels.iter().copied().max().unwrap_or(0) as usize;
    let min_width = config.min_line_width * scale;
    let min_height = config.min_line_height * scale;
    find_objects(labels, max_label)
        .into_iter()
        .enumerate()
        .filter_map(|(i, bounds)| {
            let bounds = bounds?;
            if (bounds.width() as f32) < min_width || (bounds.height() as f32) < min_height {
                debug!("dropping line {} ({}x{})", i + 1, bounds.height(), bounds.width());
                return None;
            }
            Some(LineCandidate {
                raw: i as u32 + 1,
                bounds,
            })
        })
        .collect()
}

/// Whether `u` is read before `v`.
///
/// In [`ReadingOrderMode::Columns`] lines sharing columns read top to bottom;
/// otherwise the left line goes first unless some line in `all` separates
/// them. In [`ReadingOrderMode::RowMajor`] lines sharing rows read left to
/// right and all others top to bottom.
pub fn precedes(u: &LineBounds, v: &LineBounds, all: &[LineBounds], mode: ReadingOrderMode) -> bool {
    match mode {
        ReadingOrderMode::Columns => {
            if u.x_overlaps(v) {
                u.above(v)
            } else {
                u.left_of(v) && !all.iter().any(|w| w.separates(u, v))
            }
        }
        ReadingOrderMode::RowMajor => {
            if u.y_overlaps(v) {
                u.x0 < v.x0
            } else {
                u.above(v)
            }
        }
    }
}

/// The precedes relation as a matrix: `order[i][j]` means line `i` comes before line `j`.
pub fn reading_order(bounds: &[LineBounds], mode: ReadingOrderMode) -> Vec<Vec<bool>> {
    bounds
        .iter()
        .map(|u| bounds.iter().map(|v| precedes(u, v, bounds, mode)).collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Topologically sorts the relation, visiting lines in index order and placing
/// every line after all its predecessors.
///
/// # Errors
///
/// Returns `SegError::ReadingOrderCycle` naming a label on the cycle; `labels[i]`
/// names line `i`.
pub fn topsort(order: &[Vec<bool>], labels: &[u32]) -> SegResult<Vec<usize>> {
    let n = order.len();
    let mut state = vec![Visit::New; n];
    let mut sorted = Vec::with_capacity(n);
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in 0..n {
        if state[start] != Visit::New {
            continue;
        }
        state[start] = Visit::Active;
        stack.push((start, 0));
        while let Some((k, next)) = stack.last_mut() {
            let k = *k;
            match (*next..n).find(|&l| order[l][k]) {
                Some(l) => {
                    *next = l + 1;
                    match state[l] {
                        Visit::New => {
                            state[l] = Visit::Active;
                            stack.push((l, 0));
                        }
                        Visit::Active => {
                            return Err(SegError::ReadingOrderCycle {
                                label: labels.get(l).copied().unwrap_or(l as u32),
                            });
                        }
                        Visit::Done => {}
                    }
                }
                None => {
                    state[k] = Visit::Done;
                    sorted.push(k);
                    stack.pop();
                }
            }
        }
    }
    Ok(sorted)
}

/// Orders the candidate lines and relabels the segmentation.
///
/// Pixels of labels without a candidate are cleared.
pub fn order_lines(
    labels: &Array2<u32>,
    candidates: &[LineCandidate],
    mode: ReadingOrderMode,
) -> SegResult<Segmentation> {
    let bounds: Vec<LineBounds> = candidates.iter().map(|c| c.bounds).collect();
    let raw: Vec<u32> = candidates.iter().map(|c| c.raw).collect();
    let order = reading_order(&bounds, mode);
    let sorted = topsort(&order, &raw)?;

    let mut renumber: HashMap<u32, LineLabel> = HashMap::with_capacity(sorted.len());
    for (rank, &i) in sorted.iter().enumerate() {
        let label = LineLabel::from_index(rank + 1).ok_or_else(|| SegError::TooManyLines {
            count: sorted.len(),
            max: crate::core::constants::MAX_LINE_INDEX as usize,
        })?;
        renumber.insert(candidates[i].raw, label);
    }
    let relabeled = labels.mapv(|l| renumber.get(&l).map_or(0, LineLabel::raw));

    let lines = sorted
        .iter()
        .map(|&i| {
            let candidate = &candidates[i];
            let label = renumber[&candidate.raw];
            TextLine::from_raster(&relabeled, label.raw(), label, candidate.bounds)
        })
        .collect();
    debug!("reading order: {:?}", sorted.iter().map(|&i| raw[i]).collect::<Vec<_>>());
    Ok(Segmentation::new(relabeled, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::LINE_LABEL_BASE;
    use ndarray::s;

    fn b(y0: usize, x0: usize, y1: usize, x1: usize) -> LineBounds {
        LineBounds::new(y0, x0, y1, x1)
    }

    #[test]
    fn test_single_column_top_to_bottom() {
        let lines = [b(200, 0, 220, 100), b(0, 0, 20, 100), b(100, 10, 120, 90)];
        let order = reading_order(&lines, ReadingOrderMode::Columns);
        let sorted = topsort(&order, &[1, 2, 3]).unwrap();
        assert_eq!(sorted, vec![1, 2, 0]);
    }

    #[test]
    fn test_two_columns_left_first() {
        // left column lines 0, 1; right column lines 2, 3
        let lines = [
            b(0, 0, 20, 100),
            b(40, 0, 60, 100),
            b(0, 150, 20, 250),
            b(40, 150, 60, 250),
        ];
        let order = reading_order(&lines, ReadingOrderMode::Columns);
        let sorted = topsort(&order, &[1, 2, 3, 4]).unwrap();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_spanning_line_separates_columns() {
        // a title spanning both columns, two columns below it, a footer spanning both
        let lines = [
            b(100, 0, 120, 100),
            b(100, 150, 120, 250),
            b(0, 0, 20, 250),
            b(200, 0, 220, 250),
            b(140, 150, 160, 250),
        ];
        let order = reading_order(&lines, ReadingOrderMode::Columns);
        let sorted = topsort(&order, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(sorted, vec![2, 0, 1, 4, 3]);
    }

    #[test]
    fn test_row_major_mode() {
        let lines = [b(0, 150, 20, 250), b(5, 0, 25, 100), b(50, 0, 70, 100)];
        let order = reading_order(&lines, ReadingOrderMode::RowMajor);
        let sorted = topsort(&order, &[1, 2, 3]).unwrap();
        assert_eq!(sorted, vec![1, 0, 2]);
    }

    #[test]
    fn test_no_line_read_before_one_above_and_left() {
        let lines = [
            b(0, 0, 20, 100),
            b(40, 0, 60, 100),
            b(0, 150, 20, 250),
            b(40, 150, 60, 250),
            b(80, 0, 100, 250),
        ];
        for mode in [ReadingOrderMode::Columns, ReadingOrderMode::RowMajor] {
            let sorted = topsort(&reading_order(&lines, mode), &[1, 2, 3, 4, 5]).unwrap();
            for (i, &a) in sorted.iter().enumerate() {
                for &later in &sorted[i + 1..] {
                    let (u, v) = (lines[a], lines[later]);
                    // an earlier line never lies entirely below and right of a later one
                    assert!(!(u.y0 >= v.y1 && u.x0 >= v.x1), "{u:?} before {v:?}");
                }
            }
        }
    }

    #[test]
    fn test_cycle_is_reported() {
        let order = vec![
            vec![false, true, false],
            vec![false, false, true],
            vec![true, false, false],
        ];
        assert!(matches!(
            topsort(&order, &[10, 11, 12]),
            Err(SegError::ReadingOrderCycle { .. })
        ));
    }

    #[test]
    fn test_candidates_drop_small_lines() {
        let mut labels = Array2::<u32>::zeros((100, 200));
        labels.slice_mut(s![10..30, 10..150]).fill(1);
        labels.slice_mut(s![50..52, 10..150]).fill(2); // too short
        labels.slice_mut(s![70..90, 10..20]).fill(3); // too narrow
        let candidates = line_candidates(&labels, 16.0, &LineConfig::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].raw, 1);
        assert_eq!(candidates[0].bounds, b(10, 10, 30, 150));
    }

    #[test]
    fn test_order_lines_relabels() {
        let mut labels = Array2::<u32>::zeros((100, 200));
        labels.slice_mut(s![60..80, 10..150]).fill(1);
        labels.slice_mut(s![10..30, 10..150]).fill(2);
        labels.slice_mut(s![40..41, 10..12]).fill(3); // not a candidate
        let candidates = line_candidates(&labels, 16.0, &LineConfig::default());
        let seg = order_lines(&labels, &candidates, ReadingOrderMode::Columns).unwrap();
        assert_eq!(seg.len(), 2);
        assert_eq!(seg.labels()[[15, 20]], LINE_LABEL_BASE + 1);
        assert_eq!(seg.labels()[[65, 20]], LINE_LABEL_BASE + 2);
        assert_eq!(seg.labels()[[40, 10]], 0);
        assert_eq!(seg.lines()[0].bounds, b(10, 10, 30, 150));
        assert_eq!(seg.lines()[1].index(), 2);
        assert_eq!(seg.lines()[0].pixel_count(), 20 * 140);
    }
}
