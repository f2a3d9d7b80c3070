//! The core module of the segmentation pipeline.
//!
//! This module contains the pieces every stage depends on:
//! - Configuration and its TOML/JSON loader
//! - Constants and the line label namespace
//! - Debug sinks for intermediate rasters
//! - Error handling

pub mod config;
pub mod constants;
pub mod debug;
pub mod errors;

pub use config::{
    BatchConfig, BinarizeConfig, ColumnConfig, ConfigFormat, ConfigLoader, ConfigValidator,
    ExtractConfig, LineConfig, ReadingOrderMode, ScaleConfig, SegmentationConfig,
};
pub use constants::*;
pub use debug::{DebugArtifact, DebugSink, DirectorySink, NoopSink};
pub use errors::{PageDefect, ProcessingStage, SegError, SegResult};
