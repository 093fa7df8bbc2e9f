//! Fit reporting.
//!
//! A [`FitRecord`] is the flat, serializable view of one fitted sweep. The
//! text layouts in [`format`] and the JSON export are all rendered from it.

use serde::Serialize;

use crate::domain::{ModelVariant, ParameterVector, Sample};
use crate::fit::{FitReport, OverloadRefit};

pub mod format;

pub use format::*;

/// One parameter with its standard error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub name: &'static str,
    pub value: f64,
    pub error: f64,
}

/// Everything printed or exported for one sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitRecord {
    /// Midpoint of the first and last sample timestamps (input order).
    pub time: f64,
    pub variant: ModelVariant,
    pub samples: usize,
    /// `false` when only the initial guess is reported.
    pub fitted: bool,
    /// RMS residual in physical units (0 without a fit).
    pub residual: f64,
    pub parameters: Vec<NamedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overload: Option<OverloadRefit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<String>,
}

impl FitRecord {
    /// Record of a completed fit.
    pub fn from_report(samples: &[Sample], report: &FitReport) -> Self {
        let result = &report.result;
        Self {
            time: fit_time(samples),
            variant: result.variant(),
            samples: samples.len(),
            fitted: true,
            residual: result.residual,
            parameters: named_values(&result.parameters, &result.errors),
            overload: report.overload.clone(),
            termination: Some(report.termination.clone()),
        }
    }

    /// Record of an initial guess: zero errors, zero residual.
    pub fn from_guess(samples: &[Sample], guess: &ParameterVector) -> Self {
        let zeros = ParameterVector::zeros(guess.variant());
        Self {
            time: fit_time(samples),
            variant: guess.variant(),
            samples: samples.len(),
            fitted: false,
            residual: 0.0,
            parameters: named_values(guess, &zeros),
            overload: None,
            termination: None,
        }
    }
}

/// Midpoint of the first and last sample's timestamps (0 for no samples).
pub fn fit_time(samples: &[Sample]) -> f64 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first.time + last.time) / 2.0,
        _ => 0.0,
    }
}

fn named_values(values: &ParameterVector, errors: &ParameterVector) -> Vec<NamedValue> {
    values
        .named()
        .zip(errors.as_slice().iter().copied())
        .map(|((name, value), error)| NamedValue { name, value, error })
        .collect()
}
