//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - measured samples (`Sample`)
//! - lineshape selection (`Response`, `ModelVariant`)
//! - parameter vectors and fit outputs (`ParameterVector`, `FitResult`)
//! - run configuration (`FitConfig`, `Scaling`, `OutputFormat`)

pub mod types;

pub use types::*;
