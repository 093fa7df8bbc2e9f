//! `resonance-fit` library crate.
//!
//! The binary (`resfit`) is a thin wrapper around this library so that:
//!
//! - the numerical core is testable without spawning processes
//! - the fitter can be embedded in other measurement pipelines

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
