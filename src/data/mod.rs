//! Synthetic sweep generation (for the `synth` command and for tests).

pub mod synth;

pub use synth::*;
