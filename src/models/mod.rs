//! Resonance lineshape evaluation for the six model variants.
//!
//! Models are implemented as small, pure functions so that the solver adapter
//! and the tests can call them without any state.

pub mod model;

pub use model::*;
