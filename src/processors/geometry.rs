//! Axis-aligned raster geometry.
//!
//! Connected components, text lines and crops are all described by [`Bounds`],
//! a half-open pixel rectangle in row/column order.

use ndarray::{ArrayBase, ArrayView2, ArrayViewMut2, Data, DataMut, Ix2, s};
use serde::{Deserialize, Serialize};

/// A half-open rectangle `[y0, y1) x [x0, x1)` in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// First row.
    pub y0: usize,
    /// First column.
    pub x0: usize,
    /// One past the last row.
    pub y1: usize,
    /// One past the last column.
    pub x1: usize,
}

impl Bounds {
    /// Creates bounds from the first row/column and the exclusive end row/column.
    ///
    /// # Arguments
    ///
    /// * `y0` - First row.
    /// * `x0` - First column.
    /// * `y1` - One past the last row.
    /// * `x1` - One past the last column.
    ///
    /// # Returns
    ///
    /// A new `Bounds`; reversed coordinates are collapsed to an empty rectangle.
    #[inline]
    pub fn new(y0: usize, x0: usize, y1: usize, x1: usize) -> Self {
        Self {
            y0,
            x0,
            y1: y1.max(y0),
            x1: x1.max(x0),
        }
    }

    /// Bounds covering a single pixel.
    #[inline]
    pub fn pixel(y: usize, x: usize) -> Self {
        Self::new(y, x, y + 1, x + 1)
    }

    /// Number of rows covered.
    #[inline]
    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    /// Number of columns covered.
    #[inline]
    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    /// Covered pixel count.
    #[inline]
    pub fn area(&self) -> usize {
        self.height() * self.width()
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Grows the rectangle to include the pixel `(y, x)`.
    pub fn include(&mut self, y: usize, x: usize) {
        self.y0 = self.y0.min(y);
        self.x0 = self.x0.min(x);
        self.y1 = self.y1.max(y + 1);
        self.x1 = self.x1.max(x + 1);
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            self.y0.min(other.y0),
            self.x0.min(other.x0),
            self.y1.max(other.y1),
            self.x1.max(other.x1),
        )
    }

    /// Grows by `margin` on every side, clipped to a raster of `shape`.
    pub fn padded(&self, margin: usize, shape: (usize, usize)) -> Bounds {
        Bounds::new(
            self.y0.saturating_sub(margin),
            self.x0.saturating_sub(margin),
            (self.y1 + margin).min(shape.0),
            (self.x1 + margin).min(shape.1),
        )
    }

    /// True when the row ranges intersect.
    #[inline]
    pub fn y_overlaps(&self, other: &Bounds) -> bool {
        self.y0 < other.y1 && other.y0 < self.y1
    }

    /// True when the column ranges intersect.
    #[inline]
    pub fn x_overlaps(&self, other: &Bounds) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1
    }

    /// True when `self` starts on an earlier row than `other`.
    #[inline]
    pub fn above(&self, other: &Bounds) -> bool {
        self.y0 < other.y0
    }

    /// True when `self` lies entirely to the left of `other`.
    #[inline]
    pub fn left_of(&self, other: &Bounds) -> bool {
        self.x1 < other.x0
    }

    /// True when `self` spans the gap between `u` (left) and `v` (right):
    /// its rows reach the rows of either line and its columns straddle the
    /// interval from the end of `u` to the start of `v`.
    pub fn separates(&self, u: &Bounds, v: &Bounds) -> bool {
        if self.y1 < u.y0.min(v.y0) || self.y0 > u.y1.max(v.y1) {
            return false;
        }
        self.x0 < u.x1 && self.x1 > v.x0
    }

    /// View of `raster` covered by the rectangle.
    pub fn view<'a, S, T>(&self, raster: &'a ArrayBase<S, Ix2>) -> ArrayView2<'a, T>
    where
        S: Data<Elem = T>,
    {
        raster.slice(s![self.y0..self.y1, self.x0..self.x1])
    }

    /// Mutable view of `raster` covered by the rectangle.
    pub fn view_mut<'a, S, T>(&self, raster: &'a mut ArrayBase<S, Ix2>) -> ArrayViewMut2<'a, T>
    where
        S: DataMut<Elem = T>,
    {
        raster.slice_mut(s![self.y0..self.y1, self.x0..self.x1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_bounds_dimensions() {
        let b = Bounds::new(2, 3, 6, 10);
        assert_eq!(b.height(), 4);
        assert_eq!(b.width(), 7);
        assert_eq!(b.area(), 28);
        assert!(Bounds::new(5, 5, 2, 2).is_empty());
    }

    #[test]
    fn test_include_and_union() {
        let mut b = Bounds::pixel(4, 4);
        b.include(2, 7);
        assert_eq!(b, Bounds::new(2, 4, 5, 8));
        let u = b.union(&Bounds::new(0, 0, 1, 1));
        assert_eq!(u, Bounds::new(0, 0, 5, 8));
    }

    #[test]
    fn test_padded_is_clipped() {
        let b = Bounds::new(1, 1, 9, 9);
        assert_eq!(b.padded(3, (10, 11)), Bounds::new(0, 0, 10, 11));
    }

    #[test]
    fn test_overlap_predicates() {
        let a = Bounds::new(0, 0, 10, 10);
        let b = Bounds::new(5, 20, 15, 30);
        assert!(a.y_overlaps(&b));
        assert!(!a.x_overlaps(&b));
        assert!(a.left_of(&b));
        assert!(a.above(&b));
        // touching edges do not overlap
        let c = Bounds::new(10, 0, 20, 10);
        assert!(!a.y_overlaps(&c));
    }

    #[test]
    fn test_separates() {
        let u = Bounds::new(0, 0, 10, 40);
        let v = Bounds::new(20, 60, 30, 100);
        let rule = Bounds::new(12, 10, 14, 90);
        assert!(rule.separates(&u, &v));
        let far = Bounds::new(50, 10, 52, 90);
        assert!(!far.separates(&u, &v));
        let narrow = Bounds::new(12, 0, 14, 30);
        assert!(!narrow.separates(&u, &v));
    }

    #[test]
    fn test_view() {
        let raster = Array2::from_shape_fn((5, 5), |(y, x)| y * 10 + x);
        let b = Bounds::new(1, 2, 3, 4);
        let v = b.view(&raster);
        assert_eq!(v.dim(), (2, 2));
        assert_eq!(v[[0, 0]], 12);
        assert_eq!(v[[1, 1]], 23);
    }
}
