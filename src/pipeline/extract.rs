//! Cutting individual text lines out of the page.

use crate::core::config::ExtractConfig;
use crate::domain::{LineBounds, LineLabel, Segmentation, TextLine};
use crate::processors::morphology::dilate_square;
use ndarray::{Array2, Zip};

/// A text line cut out of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedLine {
    /// Label of the line.
    pub label: LineLabel,
    /// Page region the crop covers: the line box grown by the padding, clipped.
    pub region: LineBounds,
    /// Ink raster of the crop; 1 = ink.
    pub binary: Array2<u8>,
    /// Normalized gray crop with everything outside the line mask set to white.
    pub gray: Option<Array2<f32>>,
}

/// Line mask over `region`, grown by `expand` pixels.
fn region_mask(labels: &Array2<u32>, line: &TextLine, region: &LineBounds, expand: usize) -> Array2<u8> {
    let raw = line.label.raw();
    let mask = region.view(labels).mapv(|l| (l == raw) as u8);
    dilate_square(&mask, expand.min(u8::MAX as usize) as u8)
}

/// Extracts the ink of one line from `cleaned`.
///
/// The crop covers the line box grown by `pad` pixels and clipped to the page;
/// only ink inside the line mask (grown by `expand` pixels) is kept.
pub fn extract_masked(
    cleaned: &Array2<u8>,
    segmentation: &Segmentation,
    line: &TextLine,
    pad: usize,
    expand: usize,
) -> (LineBounds, Array2<u8>) {
    let region = line.bounds.padded(pad, cleaned.dim());
    let mut crop = region_mask(segmentation.labels(), line, &region, expand);
    Zip::from(&mut crop)
        .and(&region.view(cleaned))
        .for_each(|m, &ink| *m &= (ink != 0) as u8);
    (region, crop)
}

/// Extracts the normalized gray pixels of one line; pixels outside the mask are white.
pub fn extract_gray(
    normalized: &Array2<f32>,
    segmentation: &Segmentation,
    line: &TextLine,
    pad: usize,
    expand: usize,
) -> (LineBounds, Array2<f32>) {
    let region = line.bounds.padded(pad, normalized.dim());
    let mask = region_mask(segmentation.labels(), line, &region, expand);
    let mut crop = region.view(normalized).to_owned();
    Zip::from(&mut crop).and(&mask).for_each(|g, &m| {
        if m == 0 {
            *g = 1.0;
        }
    });
    (region, crop)
}

/// Extracts every line of `segmentation` in reading order.
pub fn extract_lines(
    cleaned: &Array2<u8>,
    normalized: Option<&Array2<f32>>,
    segmentation: &Segmentation,
    config: &ExtractConfig,
) -> Vec<ExtractedLine> {
    segmentation
        .lines()
        .iter()
        .map(|line| {
            let (region, binary) =
                extract_masked(cleaned, segmentation, line, config.pad, config.expand);
            let gray = normalized
                .filter(|_| config.gray)
                .map(|n| extract_gray(n, segmentation, line, config.pad, config.expand).1);
            ExtractedLine {
                label: line.label,
                region,
                binary,
                gray,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::labeling::remove_noise;
    use ndarray::s;

    fn one_line_page() -> (Array2<u8>, Segmentation) {
        let mut binary = Array2::<u8>::zeros((60, 100));
        binary.slice_mut(s![20..30, 10..90]).fill(1);
        binary.slice_mut(s![45..50, 10..90]).fill(1); // ink of another region
        let mut labels = Array2::<u32>::zeros((60, 100));
        labels.slice_mut(s![20..30, 10..90]).fill(0x010001);
        let label = LineLabel::from_index(1).unwrap();
        let line = TextLine::from_raster(&labels, 0x010001, label, LineBounds::new(20, 10, 30, 90));
        (binary, Segmentation::new(labels, vec![line]))
    }

    #[test]
    fn test_crop_is_padded_and_masked() {
        let (binary, seg) = one_line_page();
        let (region, crop) = extract_masked(&binary, &seg, &seg.lines()[0], 3, 3);
        assert_eq!(region, LineBounds::new(17, 7, 33, 93));
        assert_eq!(crop.dim(), (16, 86));
        assert_eq!(crop.iter().map(|&v| v as usize).sum::<usize>(), 10 * 80);
        assert_eq!(crop[[3, 3]], 1);
        assert_eq!(crop[[0, 0]], 0);
    }

    #[test]
    fn test_crop_clipped_at_page_edge() {
        let (binary, seg) = one_line_page();
        let (region, crop) = extract_masked(&binary, &seg, &seg.lines()[0], 30, 0);
        assert_eq!(region, LineBounds::new(0, 0, 60, 100));
        assert_eq!(crop.dim(), (60, 100));
        // ink outside the line mask is not copied
        assert_eq!(crop[[47, 50]], 0);
    }

    #[test]
    fn test_expand_recovers_touching_ink() {
        let (mut binary, seg) = one_line_page();
        binary.slice_mut(s![30..32, 40..42]).fill(1); // descender below the label
        let (_, tight) = extract_masked(&binary, &seg, &seg.lines()[0], 3, 0);
        let (_, loose) = extract_masked(&binary, &seg, &seg.lines()[0], 3, 3);
        assert_eq!(tight[[3 + 10, 3 + 30]], 0);
        assert_eq!(loose[[3 + 10, 3 + 30]], 1);
        assert_eq!(loose[[3 + 11, 3 + 31]], 1);
    }

    #[test]
    fn test_gray_extraction_whitens_background() {
        let (binary, seg) = one_line_page();
        let normalized = binary.mapv(|v| if v != 0 { 0.0f32 } else { 0.8 });
        let config = ExtractConfig {
            gray: true,
            pad: 5,
            ..Default::default()
        };
        let lines = extract_lines(&binary, Some(&normalized), &seg, &config);
        let gray = lines[0].gray.as_ref().unwrap();
        assert_eq!(lines[0].region, LineBounds::new(15, 5, 35, 95));
        assert_eq!(gray.dim(), lines[0].binary.dim());
        assert_eq!(gray[[0, 0]], 1.0);
        assert_eq!(gray[[5, 5]], 0.0);
        // inside the expanded mask but off the ink
        assert_eq!(gray[[3, 5]], 0.8);
    }

    #[test]
    fn test_speck_removed_before_extraction() {
        let (mut binary, seg) = one_line_page();
        binary.slice_mut(s![31..33, 60..62]).fill(1);
        let cleaned = remove_noise(&binary, 8);
        assert_eq!(cleaned[[31, 60]], 0);
        assert_eq!(cleaned[[25, 50]], 1);
        let lines = extract_lines(&cleaned, None, &seg, &ExtractConfig::default());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].gray.is_none());
        assert_eq!(lines[0].binary.iter().map(|&v| v as usize).sum::<usize>(), 800);
    }
}
