//! Line-box overlays for inspecting segmentation results.
//!
//! The overlay shows the input page in gray with every text line's bounding
//! box drawn on top, colored by reading position so neighbouring lines are
//! easy to tell apart.

use crate::domain::TextLine;
use crate::utils::image::float_to_gray;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ndarray::ArrayView2;
use tracing::debug;

const BOX_COLORS: [Rgb<u8>; 3] = [Rgb([255, 0, 0]), Rgb([0, 160, 0]), Rgb([0, 0, 255])];

/// Settings for [`draw_line_boxes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayConfig {
    /// Line thickness of the boxes in pixels.
    pub thickness: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { thickness: 2 }
    }
}

/// Bounding box of a line as an imageproc rectangle, grown outwards by `grow`.
fn line_rect(line: &TextLine, grow: u32, img_bounds: (u32, u32)) -> Option<Rect> {
    let b = &line.bounds;
    if b.is_empty() {
        return None;
    }
    let left = b.x0 as i32 - grow as i32;
    let top = b.y0 as i32 - grow as i32;
    let width = b.width() as u32 + 2 * grow;
    let height = b.height() as u32 + 2 * grow;
    let (img_w, img_h) = img_bounds;
    let inside = left >= 0
        && top >= 0
        && left as u32 + width <= img_w
        && top as u32 + height <= img_h;
    inside.then(|| Rect::at(left, top).of_size(width, height))
}

/// Draws the bounding box of every line over a gray page raster.
///
/// # Arguments
///
/// * `page` - Gray raster in [0, 1] the boxes are drawn on.
/// * `lines` - Lines in reading order.
/// * `config` - Drawing settings.
///
/// # Returns
///
/// * `RgbImage` - The page with line boxes
pub fn draw_line_boxes(page: ArrayView2<'_, f32>, lines: &[TextLine], config: &OverlayConfig) -> RgbImage {
    let mut img = DynamicImage::ImageLuma8(float_to_gray(page, false)).to_rgb8();
    let bounds = img.dimensions();
    for (i, line) in lines.iter().enumerate() {
        let color = BOX_COLORS[i % BOX_COLORS.len()];
        for grow in 0..config.thickness {
            // boxes that would leave the page are drawn only as far as they fit
            if let Some(rect) = line_rect(line, grow, bounds) {
                draw_hollow_rect_mut(&mut img, rect, color);
            }
        }
    }
    debug!("overlay: {} line boxes", lines.len());
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineBounds, LineLabel};
    use ndarray::{Array2, s};

    fn line(index: usize, bounds: LineBounds) -> TextLine {
        let label = LineLabel::from_index(index).unwrap();
        let mut labels = Array2::<u32>::zeros((40, 60));
        bounds.view_mut(&mut labels).fill(label.raw());
        TextLine::from_raster(&labels, label.raw(), label, bounds)
    }

    #[test]
    fn test_boxes_drawn_on_page() {
        let mut page = Array2::<f32>::ones((40, 60));
        page.slice_mut(s![10..20, 10..50]).fill(0.0);
        let lines = vec![line(1, LineBounds::new(10, 10, 20, 50))];
        let img = draw_line_boxes(page.view(), &lines, &OverlayConfig::default());
        assert_eq!(img.dimensions(), (60, 40));
        assert_eq!(*img.get_pixel(10, 10), BOX_COLORS[0]);
        // one pixel outside for the second stroke
        assert_eq!(*img.get_pixel(9, 9), BOX_COLORS[0]);
        assert_eq!(*img.get_pixel(30, 15), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(2, 2), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_box_touching_edge_keeps_inner_stroke() {
        let page = Array2::<f32>::ones((40, 60));
        let lines = vec![line(2, LineBounds::new(0, 0, 10, 30))];
        let img = draw_line_boxes(page.view(), &lines, &OverlayConfig { thickness: 3 });
        assert_eq!(*img.get_pixel(0, 0), BOX_COLORS[0]);
        assert_eq!(*img.get_pixel(5, 5), Rgb([255, 255, 255]));
    }
}
