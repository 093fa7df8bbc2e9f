//! Shared domain types.
//!
//! These types are intentionally kept small and plain so they can be:
//!
//! - passed through the numerical core without conversions
//! - printed in the flat table / `name=value` formats
//! - serialized to JSON for downstream tooling

use std::ops::{Index, IndexMut};
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One measured point of a frequency sweep.
///
/// Samples keep their arrival order. Fitting does not care about the order, but
/// the reported fit time is taken from the first and last sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub freq: f64,
    pub real: f64,
    pub imag: f64,
}

impl Sample {
    pub fn new(time: f64, freq: f64, real: f64, imag: f64) -> Self {
        Self {
            time,
            freq,
            real,
            imag,
        }
    }
}

/// Which physical quantity the instrument measures.
///
/// A velocity response is the coordinate response multiplied by `i·w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    /// Signal proportional to displacement.
    #[value(name = "coord", alias = "coordinate")]
    Coordinate,
    /// Signal proportional to the time derivative of displacement.
    #[value(alias = "speed")]
    Velocity,
}

/// Resonance lineshape variant.
///
/// Parameter layout (indices into [`ParameterVector`]):
///
/// ```text
/// *_COFFS   A B C D w0 dw
/// *_LOFFS   A B C D w0 dw E F
/// DOSC*     A B C D w0 dw C2 D2 w02 dw2
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelVariant {
    OscxCoffs,
    OscxLoffs,
    OscvCoffs,
    OscvLoffs,
    DoscxCoffs,
    DoscvCoffs,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 6] = [
        ModelVariant::OscxCoffs,
        ModelVariant::OscxLoffs,
        ModelVariant::OscvCoffs,
        ModelVariant::OscvLoffs,
        ModelVariant::DoscxCoffs,
        ModelVariant::DoscvCoffs,
    ];

    /// Largest parameter count of any variant (used only for zero padding on output).
    pub const MAX_PARAMS: usize = 10;

    /// Select a variant from the `(parameter count, response)` pair used on the command line.
    pub fn from_layout(param_count: usize, response: Response) -> Option<Self> {
        match (param_count, response) {
            (6, Response::Coordinate) => Some(ModelVariant::OscxCoffs),
            (8, Response::Coordinate) => Some(ModelVariant::OscxLoffs),
            (10, Response::Coordinate) => Some(ModelVariant::DoscxCoffs),
            (6, Response::Velocity) => Some(ModelVariant::OscvCoffs),
            (8, Response::Velocity) => Some(ModelVariant::OscvLoffs),
            (10, Response::Velocity) => Some(ModelVariant::DoscvCoffs),
            _ => None,
        }
    }

    pub fn param_count(self) -> usize {
        match self {
            ModelVariant::OscxCoffs | ModelVariant::OscvCoffs => 6,
            ModelVariant::OscxLoffs | ModelVariant::OscvLoffs => 8,
            ModelVariant::DoscxCoffs | ModelVariant::DoscvCoffs => 10,
        }
    }

    pub fn response(self) -> Response {
        match self {
            ModelVariant::OscxCoffs | ModelVariant::OscxLoffs | ModelVariant::DoscxCoffs => {
                Response::Coordinate
            }
            ModelVariant::OscvCoffs | ModelVariant::OscvLoffs | ModelVariant::DoscvCoffs => {
                Response::Velocity
            }
        }
    }

    /// `true` for the two-resonance variants.
    pub fn is_double(self) -> bool {
        matches!(self, ModelVariant::DoscxCoffs | ModelVariant::DoscvCoffs)
    }

    /// `true` for the variants with a linear-in-frequency background (`E`, `F`).
    pub fn has_linear_background(self) -> bool {
        matches!(self, ModelVariant::OscxLoffs | ModelVariant::OscvLoffs)
    }

    pub fn param_names(self) -> &'static [&'static str] {
        const SINGLE: [&str; 6] = ["A", "B", "C", "D", "w0", "dw"];
        const LINEAR: [&str; 8] = ["A", "B", "C", "D", "w0", "dw", "E", "F"];
        const DOUBLE: [&str; 10] = ["A", "B", "C", "D", "w0", "dw", "C2", "D2", "w02", "dw2"];
        if self.is_double() {
            &DOUBLE
        } else if self.has_linear_background() {
            &LINEAR
        } else {
            &SINGLE
        }
    }

    /// Label used in logs and reports.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelVariant::OscxCoffs => "OSCX_COFFS",
            ModelVariant::OscxLoffs => "OSCX_LOFFS",
            ModelVariant::OscvCoffs => "OSCV_COFFS",
            ModelVariant::OscvLoffs => "OSCV_LOFFS",
            ModelVariant::DoscxCoffs => "DOSCX_COFFS",
            ModelVariant::DoscvCoffs => "DOSCV_COFFS",
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Parameter values of one variant.
///
/// The length always equals `variant.param_count()`; there are no unused slots.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterVector {
    variant: ModelVariant,
    values: Vec<f64>,
}

impl ParameterVector {
    /// Wrap `values` for `variant`. Returns `None` on a length mismatch.
    pub fn from_values(variant: ModelVariant, values: Vec<f64>) -> Option<Self> {
        (values.len() == variant.param_count()).then_some(Self { variant, values })
    }

    /// Wrap `values` produced in `variant`'s layout by the fitting code.
    ///
    /// The length is an internal invariant: it is asserted in debug builds,
    /// and release builds pad or cut to `param_count()` with NaN so a bad
    /// length can never pass for a valid fit.
    pub fn from_layout(variant: ModelVariant, mut values: Vec<f64>) -> Self {
        debug_assert_eq!(
            values.len(),
            variant.param_count(),
            "{variant} parameter vector has the wrong length"
        );
        values.resize(variant.param_count(), f64::NAN);
        Self { variant, values }
    }

    pub fn zeros(variant: ModelVariant) -> Self {
        Self {
            variant,
            values: vec![0.0; variant.param_count()],
        }
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Value of a named parameter (`"w0"`, `"E"`, ...), if the variant has it.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.variant
            .param_names()
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    /// Resonance frequency of the (first) resonance.
    pub fn w0(&self) -> f64 {
        self.values[4]
    }

    /// Linewidth of the (first) resonance.
    pub fn dw(&self) -> f64 {
        self.values[5]
    }

    /// `(name, value)` pairs in layout order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.variant
            .param_names()
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

impl Index<usize> for ParameterVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl IndexMut<usize> for ParameterVector {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.values[index]
    }
}

/// Outcome of one resonance fit in physical units.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub parameters: ParameterVector,
    /// One standard error per parameter (same layout as `parameters`).
    pub errors: ParameterVector,
    /// RMS of the `2n` residual components.
    pub residual: f64,
}

impl FitResult {
    pub fn variant(&self) -> ModelVariant {
        self.parameters.variant()
    }
}

/// How raw samples are brought to order-one magnitudes before solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Scaling {
    /// Center real/imag on their range midpoints and divide by the smaller range.
    CenterRange,
    /// Divide real/imag by the largest magnitude, no centering.
    Amplitude,
    /// Fit in raw units.
    None,
}

/// Output layout of a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One whitespace-separated line: time, residual, value/error pairs.
    Table,
    /// `name=value` lines.
    Pairs,
    /// Pretty-printed JSON record.
    Json,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub variant: ModelVariant,
    /// Read samples from this file instead of stdin.
    pub input: Option<PathBuf>,

    /// Run the solver (otherwise only the initial guess is reported).
    pub do_fit: bool,
    /// Refit without presumably saturated samples and keep the better fit.
    pub overload_detection: bool,
    /// Fraction of the per-axis maximum above which a sample counts as overloaded.
    pub overload_fraction: f64,
    pub scaling: Scaling,

    pub max_iterations: usize,
    pub xtol: f64,
    pub gtol: f64,
    pub ftol: f64,

    pub format: OutputFormat,
    /// Pad the table output with `0 0` pairs up to the largest variant.
    pub show_zeros: bool,
    /// Fail with a dedicated exit code when there are too few samples.
    pub require_fit: bool,

    /// Also write the JSON record to this file.
    pub export: Option<PathBuf>,
    /// Write a markdown debug bundle into this directory.
    pub debug_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_selects_every_variant_once() {
        for variant in ModelVariant::ALL {
            let back = ModelVariant::from_layout(variant.param_count(), variant.response());
            assert_eq!(back, Some(variant));
            assert_eq!(variant.param_names().len(), variant.param_count());
        }
        assert_eq!(ModelVariant::from_layout(7, Response::Coordinate), None);
    }

    #[test]
    fn parameter_vector_rejects_wrong_length() {
        assert!(ParameterVector::from_values(ModelVariant::OscxCoffs, vec![0.0; 8]).is_none());
        let p = ParameterVector::from_values(
            ModelVariant::OscxLoffs,
            vec![1.0, 2.0, 3.0, 4.0, 100.0, 5.0, 0.1, 0.2],
        )
        .unwrap();
        assert_eq!(p.w0(), 100.0);
        assert_eq!(p.dw(), 5.0);
        assert_eq!(p.get("F"), Some(0.2));
        assert_eq!(p.get("C2"), None);
    }

    #[test]
    fn from_layout_keeps_matching_values() {
        let p = ParameterVector::from_layout(ModelVariant::OscvCoffs, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(p.variant(), ModelVariant::OscvCoffs);
        assert_eq!(p.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "wrong length")]
    fn from_layout_rejects_wrong_length_in_debug_builds() {
        let _ = ParameterVector::from_layout(ModelVariant::OscxLoffs, vec![0.0; 6]);
    }
}
