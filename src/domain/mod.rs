//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - disk geometry (`Disk`, `DetectionMethod`)
//! - the extracted radial profile (`RadialProfile`)
//! - model identifiers and request selectors (`ModelKind`, `ModelSelector`)
//! - fit outputs (`FitResult`)
//! - the run configuration (`AnalysisConfig`)

pub mod types;

pub use types::*;
