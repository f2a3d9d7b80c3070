//! Text lines and the page segmentation they partition.

use crate::core::constants::{LINE_LABEL_BASE, MAX_LINE_INDEX};
use crate::processors::geometry::Bounds;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bounding box of a text line, `(y0, x0, y1, x1)` half-open.
pub type LineBounds = Bounds;

/// Segmentation label of a text line.
///
/// Line labels live in their own namespace above [`LINE_LABEL_BASE`]; the
/// label of the `i`-th line in reading order is `LINE_LABEL_BASE + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineLabel(u32);

impl LineLabel {
    /// Label of the line at 1-based reading position `index`.
    pub fn from_index(index: usize) -> Option<Self> {
        (1..=MAX_LINE_INDEX as usize)
            .contains(&index)
            .then(|| Self(LINE_LABEL_BASE + index as u32))
    }

    /// Wraps a raw raster value, if it lies in the line namespace.
    pub fn from_raw(raw: u32) -> Option<Self> {
        raw.checked_sub(LINE_LABEL_BASE)
            .and_then(|i| Self::from_index(i as usize))
    }

    /// 1-based reading position.
    pub fn index(&self) -> usize {
        (self.0 - LINE_LABEL_BASE) as usize
    }

    /// Value stored in the segmentation raster.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// File stem used for the line's raster, e.g. `010001`.
    pub fn file_stem(&self) -> String {
        format!("01{:04x}", self.index())
    }
}

impl fmt::Display for LineLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}", self.0)
    }
}

/// One detected text line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Segmentation label; encodes the reading position.
    pub label: LineLabel,
    /// Bounding box in page coordinates.
    pub bounds: LineBounds,
    /// Pixels of the line inside `bounds`.
    pub mask: Array2<bool>,
}

impl TextLine {
    /// Builds a line from the pixels of `labels` equal to `raw` inside `bounds`.
    pub fn from_raster(labels: &Array2<u32>, raw: u32, label: LineLabel, bounds: LineBounds) -> Self {
        let mask = bounds.view(labels).mapv(|l| l == raw);
        Self {
            label,
            bounds,
            mask,
        }
    }

    /// 1-based reading position.
    pub fn index(&self) -> usize {
        self.label.index()
    }

    /// Number of pixels carrying the label.
    pub fn pixel_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// The page partition into text lines.
///
/// Every positive value of [`labels`](Self::labels) is the label of exactly one
/// entry of [`lines`](Self::lines), which are stored in reading order.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    labels: Array2<u32>,
    lines: Vec<TextLine>,
}

impl Segmentation {
    pub(crate) fn new(labels: Array2<u32>, lines: Vec<TextLine>) -> Self {
        Self { labels, lines }
    }

    /// Label raster of page shape; 0 is background.
    pub fn labels(&self) -> &Array2<u32> {
        &self.labels
    }

    /// Lines in reading order.
    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    /// Looks up a line by label.
    pub fn line(&self, label: LineLabel) -> Option<&TextLine> {
        let i = label.index().checked_sub(1)?;
        self.lines.get(i).filter(|l| l.label == label)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Page shape as `(rows, cols)`.
    pub fn dim(&self) -> (usize, usize) {
        self.labels.dim()
    }

    pub fn into_labels(self) -> Array2<u32> {
        self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_label_namespace() {
        let l = LineLabel::from_index(1).unwrap();
        assert_eq!(l.raw(), 0x010001);
        assert_eq!(l.index(), 1);
        assert_eq!(l.file_stem(), "010001");
        assert_eq!(l.to_string(), "0x010001");
        assert_eq!(LineLabel::from_index(0x1a).unwrap().file_stem(), "01001a");

        assert!(LineLabel::from_index(0).is_none());
        assert!(LineLabel::from_raw(5).is_none());
        assert!(LineLabel::from_raw(LINE_LABEL_BASE).is_none());
        assert_eq!(LineLabel::from_raw(0x010003).map(|l| l.index()), Some(3));
    }

    #[test]
    fn test_text_line_mask() {
        let mut labels = Array2::<u32>::zeros((6, 6));
        labels[[1, 2]] = 0x010001;
        labels[[2, 3]] = 0x010001;
        labels[[2, 2]] = 0x010002;
        let label = LineLabel::from_index(1).unwrap();
        let line = TextLine::from_raster(&labels, 0x010001, label, Bounds::new(1, 2, 3, 4));
        assert_eq!(line.mask.dim(), (2, 2));
        assert_eq!(line.pixel_count(), 2);
        assert!(!line.mask[[1, 0]]);
        assert_eq!(line.index(), 1);
    }

    #[test]
    fn test_segmentation_lookup() {
        let mut labels = Array2::<u32>::zeros((4, 4));
        labels[[0, 0]] = 0x010001;
        let label = LineLabel::from_index(1).unwrap();
        let line = TextLine::from_raster(&labels, 0x010001, label, Bounds::pixel(0, 0));
        let seg = Segmentation::new(labels, vec![line]);
        assert_eq!(seg.len(), 1);
        assert!(seg.line(label).is_some());
        assert!(seg.line(LineLabel::from_index(2).unwrap()).is_none());
        assert_eq!(seg.dim(), (4, 4));
    }
}
