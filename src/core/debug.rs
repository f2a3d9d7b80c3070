//! Debug dumps of intermediate rasters.
//!
//! Each pipeline stage hands its interesting intermediates to a [`DebugSink`]
//! under a short name. The default [`NoopSink`] discards them; [`DirectorySink`]
//! writes them as `_<name>.png` files for inspection.

use crate::core::errors::SegError;
use crate::utils::image::{float_to_gray, rgb_from_planes};
use ndarray::{Array2, ArrayView2};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An intermediate raster handed to a [`DebugSink`].
#[derive(Debug, Clone, Copy)]
pub enum DebugArtifact<'a> {
    /// A single plane; values are rescaled by their maximum when written.
    Gray(ArrayView2<'a, f32>),
    /// Three planes shown as the red, green and blue channels.
    Rgb([ArrayView2<'a, f32>; 3]),
}

/// Receiver for intermediate rasters.
pub trait DebugSink: Send + Sync {
    /// Returns false when artifacts would be discarded, letting stages skip
    /// building composite rasters.
    fn enabled(&self) -> bool {
        true
    }

    /// Accepts one named artifact.
    fn save(&self, name: &str, artifact: DebugArtifact<'_>);
}

/// Sink that drops every artifact.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn save(&self, _name: &str, _artifact: DebugArtifact<'_>) {}
}

/// Sink writing each artifact as `_<name>.png` into a directory.
///
/// Write failures are logged and otherwise ignored; debug output never aborts a page.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates the sink, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SegError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory artifacts are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DebugSink for DirectorySink {
    fn save(&self, name: &str, artifact: DebugArtifact<'_>) {
        let path = self.dir.join(format!("_{name}.png"));
        debug!("debug {}", path.display());
        let result = match artifact {
            DebugArtifact::Gray(plane) => float_to_gray(plane, true).save(&path),
            DebugArtifact::Rgb(planes) => rgb_from_planes(planes).save(&path),
        };
        if let Err(e) = result {
            warn!("failed to write debug image {}: {}", path.display(), e);
        }
    }
}

/// Converts a mask or label raster into a float plane for dumping.
pub(crate) fn as_plane<T: Copy + Into<f64>>(raster: &Array2<T>) -> Array2<f32> {
    raster.mapv(|v| v.into() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_directory_sink_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("dbg")).unwrap();
        let plane = Array2::from_shape_fn((8, 6), |(y, x)| (y * x) as f32);
        sink.save("plane", DebugArtifact::Gray(plane.view()));
        sink.save(
            "rgb",
            DebugArtifact::Rgb([plane.view(), plane.view(), plane.view()]),
        );
        assert!(sink.dir().join("_plane.png").exists());
        assert!(sink.dir().join("_rgb.png").exists());
    }

    #[test]
    fn test_noop_sink_disabled() {
        assert!(!NoopSink.enabled());
    }
}
