//! Domain-level structures shared across the segmentation pipeline.
//!
//! This module groups the text-line types the pipeline produces and that the
//! output writers and downstream consumers read.

pub mod lines;

pub use lines::*;
