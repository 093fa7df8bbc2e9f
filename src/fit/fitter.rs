//! Fit orchestration for a single sweep.
//!
//! Given raw samples and a model variant we:
//! - normalize the data to order-one magnitudes
//! - derive starting parameters from the sweep geometry
//! - run the Levenberg–Marquardt solver with the analytic Jacobian
//! - turn the Jacobian at the solution into parameter standard errors
//! - optionally refit without overloaded samples and keep the better fit
//! - map everything back to physical units
//!
//! Nothing here fails on data quality. Too few samples means "no fit"
//! (`None`); everything else produces numbers and leaves the judgement to the
//! caller (usually by looking at the residual).

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{FitResult, ModelVariant, ParameterVector, Sample, Scaling};
use crate::fit::guess::initial_guess;
use crate::fit::scaling::Normalizer;
use crate::fit::solver::{SolverOptions, Solution, solve};
use crate::math::parameter_errors;

/// Offsets closer to zero than this are moved to it before solving.
pub const OFFSET_FLOOR: f64 = 1e-6;

/// Options that affect how each sweep is fitted.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub solver: SolverOptions,
    pub scaling: Scaling,
    /// Refit without samples near the per-axis maximum.
    pub overload_detection: bool,
    /// A sample is treated as overloaded when `|real|` or `|imag|` exceeds
    /// this fraction of the largest magnitude on that axis.
    pub overload_fraction: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            solver: SolverOptions::default(),
            scaling: Scaling::CenterRange,
            overload_detection: true,
            overload_fraction: 0.95,
        }
    }
}

/// Outcome of the overload-rejection refit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverloadRefit {
    /// Samples kept for the refit.
    pub kept: usize,
    /// Samples dropped as overloaded.
    pub rejected: usize,
    /// RMS residual of the refit (physical units).
    pub residual: f64,
    /// Whether the refit replaced the full-data fit.
    pub selected: bool,
}

/// Everything known about one fitted sweep.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Starting parameters (physical units).
    pub initial: ParameterVector,
    /// The selected fit (physical units).
    pub result: FitResult,
    /// RMS residual of the fit on all samples (physical units).
    pub full_residual: f64,
    pub overload: Option<OverloadRefit>,
    pub normalizer: Normalizer,
    /// Solver termination reason of the full-data fit.
    pub termination: String,
    pub evaluations: usize,
}

/// Fit `samples` with `variant` from a heuristic start.
///
/// Returns `None` when there are fewer samples than parameters.
pub fn fit_resonance(
    samples: &[Sample],
    variant: ModelVariant,
    opts: &FitOptions,
) -> Option<FitReport> {
    let p = variant.param_count();
    if samples.len() < p {
        debug!(n = samples.len(), p, "not enough samples, skipping fit");
        return None;
    }

    let normalizer = Normalizer::from_samples(samples, opts.scaling);
    debug!(
        scale = normalizer.scale,
        freq_scale = normalizer.freq_scale,
        real_center = normalizer.real_center,
        imag_center = normalizer.imag_center,
        "normalized samples"
    );
    let scaled = normalizer.normalize_samples(samples);

    let initial = initial_guess(variant, &scaled);
    let (full, solution) = solve_scaled(variant, &scaled, initial.clone(), &opts.solver);
    let full_residual = full.residual;

    let mut best = full;
    let mut overload = None;

    if opts.overload_detection {
        if let Some((refit, kept, rejected)) =
            overload_refit(samples, variant, &normalizer, &best.parameters, opts)
        {
            let refit_residual = refit.residual;
            let (chosen, selected) = keep_better(best, refit);
            best = chosen;
            info!(
                kept,
                rejected,
                full_residual = normalizer.denormalize_residual(full_residual),
                refit_residual = normalizer.denormalize_residual(refit_residual),
                selected,
                "overload refit"
            );
            overload = Some(OverloadRefit {
                kept,
                rejected,
                residual: normalizer.denormalize_residual(refit_residual),
                selected,
            });
        }
    }

    Some(FitReport {
        initial: normalizer.denormalize_params(&initial),
        result: denormalize(&normalizer, &best),
        full_residual: normalizer.denormalize_residual(full_residual),
        overload,
        normalizer,
        termination: solution.termination,
        evaluations: solution.evaluations,
    })
}

/// Refine caller-supplied starting parameters (physical units).
///
/// `start` is read in the layout of `variant`; a start vector of the wrong
/// length is replaced by the heuristic guess. Returns `None` when there are
/// fewer samples than parameters.
pub fn refine(
    samples: &[Sample],
    variant: ModelVariant,
    start: &ParameterVector,
    opts: &FitOptions,
) -> Option<FitResult> {
    if samples.len() < variant.param_count() {
        return None;
    }

    let normalizer = Normalizer::from_samples(samples, opts.scaling);
    let scaled = normalizer.normalize_samples(samples);
    let start = match ParameterVector::from_values(variant, start.as_slice().to_vec()) {
        Some(start) => normalizer.normalize_params(&start),
        None => {
            warn!(
                expected = variant.param_count(),
                got = start.len(),
                "start vector does not match variant, using initial guess"
            );
            initial_guess(variant, &scaled)
        }
    };
    let (fit, _) = solve_scaled(variant, &scaled, start, &opts.solver);
    Some(denormalize(&normalizer, &fit))
}

/// Solve on already-normalized samples. The result stays in normalized units.
fn solve_scaled(
    variant: ModelVariant,
    scaled: &[Sample],
    mut start: ParameterVector,
    solver: &SolverOptions,
) -> (FitResult, Solution) {
    clamp_offsets(&mut start);

    let solution = solve(variant, scaled, start.as_slice(), solver);
    if !solution.converged {
        debug!(termination = %solution.termination, "solver did not converge, using last iterate");
    }

    let errors = parameter_errors(&solution.jacobian, solution.residual_ss());
    let fit = FitResult {
        parameters: ParameterVector::from_layout(variant, solution.params.clone()),
        errors: ParameterVector::from_layout(variant, errors),
        residual: solution.rms(),
    };
    (fit, solution)
}

/// Refit on the samples that are not near the per-axis maximum.
///
/// Returns the refit (normalized units) plus kept/rejected counts, or `None`
/// when nothing was rejected or too few samples remain.
fn overload_refit(
    samples: &[Sample],
    variant: ModelVariant,
    normalizer: &Normalizer,
    start: &ParameterVector,
    opts: &FitOptions,
) -> Option<(FitResult, usize, usize)> {
    let max_x = samples.iter().fold(0.0f64, |m, s| m.max(s.real.abs()));
    let max_y = samples.iter().fold(0.0f64, |m, s| m.max(s.imag.abs()));
    let lim_x = max_x * opts.overload_fraction;
    let lim_y = max_y * opts.overload_fraction;

    let kept: Vec<Sample> = samples
        .iter()
        .filter(|s| !(s.real.abs() > lim_x || s.imag.abs() > lim_y))
        .copied()
        .collect();
    let rejected = samples.len() - kept.len();

    if rejected == 0 {
        return None;
    }
    if kept.len() < variant.param_count() {
        debug!(
            kept = kept.len(),
            rejected,
            "too few samples left after overload rejection, keeping full fit"
        );
        return None;
    }

    // Same normalization as the full fit, so both residuals are comparable.
    let scaled = normalizer.normalize_samples(&kept);
    let (refit, _) = solve_scaled(variant, &scaled, start.clone(), &opts.solver);
    Some((refit, kept.len(), rejected))
}

/// Pick the refit only if its residual is strictly lower. Returns the chosen
/// fit and whether it is the refit.
fn keep_better(full: FitResult, refit: FitResult) -> (FitResult, bool) {
    if refit.residual < full.residual {
        (refit, true)
    } else {
        (full, false)
    }
}

fn clamp_offsets(params: &mut ParameterVector) {
    for i in 0..2 {
        if params[i].abs() < OFFSET_FLOOR {
            params[i] = OFFSET_FLOOR;
        }
    }
}

fn denormalize(normalizer: &Normalizer, fit: &FitResult) -> FitResult {
    FitResult {
        parameters: normalizer.denormalize_params(&fit.parameters),
        errors: normalizer.denormalize_errors(&fit.errors),
        residual: normalizer.denormalize_residual(fit.residual),
    }
}
