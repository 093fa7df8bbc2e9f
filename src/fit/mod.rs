//! Resonance fitting.
//!
//! Responsibilities:
//!
//! - heuristic starting parameters from the sweep shape
//! - data normalization and the inverse parameter mapping
//! - Levenberg–Marquardt refinement with analytic derivatives
//! - parameter errors and the overload-rejection refit

pub mod fitter;
pub mod guess;
pub mod scaling;
pub mod solver;

pub use fitter::*;
pub use guess::*;
pub use scaling::*;
pub use solver::*;
