//! Adapter between the resonance model and the Levenberg–Marquardt solver.
//!
//! The solver itself (`levenberg-marquardt`, a MINPACK `lmder` port) is used
//! as a black box: we hand it the residual vector and the analytic Jacobian
//! from `models`, an initial parameter vector and the three tolerances, and
//! read back the final parameters together with the residuals and Jacobian at
//! that point.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn};
use tracing::debug;

use crate::domain::{ModelVariant, Sample};
use crate::models::{jacobian, residuals};

/// Iteration budget and convergence tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Approximate iteration cap.
    ///
    /// The solver counts residual evaluations in units of `p + 1`, so the cap
    /// is converted to that budget (rounded up).
    pub max_iterations: usize,
    /// Relative step-size tolerance.
    pub xtol: f64,
    /// Gradient (orthogonality) tolerance.
    pub gtol: f64,
    /// Relative reduction of the sum of squares.
    pub ftol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            xtol: 1e-10,
            gtol: 1e-10,
            ftol: 1e-10,
        }
    }
}

/// Final state of one solver run.
#[derive(Debug, Clone)]
pub struct Solution {
    pub params: Vec<f64>,
    pub residuals: DVector<f64>,
    pub jacobian: DMatrix<f64>,
    /// Human-readable termination reason.
    pub termination: String,
    pub evaluations: usize,
    pub converged: bool,
}

impl Solution {
    pub fn residual_ss(&self) -> f64 {
        self.residuals.norm_squared()
    }

    /// RMS over all `2n` residual components.
    pub fn rms(&self) -> f64 {
        if self.residuals.is_empty() {
            return 0.0;
        }
        (self.residual_ss() / self.residuals.len() as f64).sqrt()
    }
}

/// The least-squares problem for one variant over one sample set.
#[derive(Debug, Clone)]
struct ResonanceProblem<'a> {
    variant: ModelVariant,
    samples: &'a [Sample],
    params: DVector<f64>,
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for ResonanceProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &DVector<f64>) {
        self.params.copy_from(x);
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        Some(residuals(self.variant, self.params.as_slice(), self.samples))
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        Some(jacobian(self.variant, self.params.as_slice(), self.samples))
    }
}

/// Run the solver from `start`.
///
/// Non-convergence is not an error: the last iterate is returned and the
/// termination reason is kept for diagnostics only.
pub fn solve(
    variant: ModelVariant,
    samples: &[Sample],
    start: &[f64],
    opts: &SolverOptions,
) -> Solution {
    let p = variant.param_count();

    let start_residuals = residuals(variant, start, samples);
    if !start_residuals.iter().all(|v| v.is_finite()) {
        debug!(variant = %variant, "non-finite residuals at start, skipping solver");
        return Solution {
            params: start.to_vec(),
            residuals: start_residuals,
            jacobian: jacobian(variant, start, samples),
            termination: "NonFiniteStart".to_string(),
            evaluations: 1,
            converged: false,
        };
    }

    let problem = ResonanceProblem {
        variant,
        samples,
        params: DVector::from_column_slice(start),
    };

    let patience = opts.max_iterations.div_ceil(p + 1).max(1);
    let lm = LevenbergMarquardt::new()
        .with_xtol(opts.xtol)
        .with_gtol(opts.gtol)
        .with_ftol(opts.ftol)
        .with_patience(patience);

    let (problem, report) = lm.minimize(problem);

    let params = problem.params.as_slice().to_vec();
    let residuals = residuals(variant, &params, samples);
    let jacobian = jacobian(variant, &params, samples);
    let converged = report.termination.was_successful();

    debug!(
        variant = %variant,
        termination = ?report.termination,
        evaluations = report.number_of_evaluations,
        objective = report.objective_function,
        "solver finished"
    );

    Solution {
        params,
        residuals,
        jacobian,
        termination: format!("{:?}", report.termination),
        evaluations: report.number_of_evaluations,
        converged,
    }
}
