//! Linearized parameter uncertainties of a converged least-squares fit.
//!
//! With `m` residuals, `p` parameters, residual sum of squares `S` and the
//! Jacobian `J` at the solution:
//!
//! ```text
//! c      = sqrt(S / (m − p))
//! cov    = (Jᵀ J)⁻¹
//! err_i  = c · sqrt(cov_ii)
//! ```
//!
//! `(Jᵀ J)⁻¹` is built from the SVD of `J` as `V Σ⁻² Vᵀ`, which avoids forming
//! the (squared condition number) normal matrix. A rank-deficient Jacobian
//! yields non-finite entries; they are passed through as-is. A Jacobian that
//! already holds NaN or inf gives NaN errors without attempting the SVD.

use nalgebra::DMatrix;

/// Sweep limit for the SVD iteration.
const SVD_MAX_ITERATIONS: usize = 1000;

/// Unscaled covariance `(Jᵀ J)⁻¹`.
///
/// Returns `None` for a non-finite Jacobian or when the SVD does not converge.
pub fn normalized_covariance(jacobian: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if !jacobian.iter().all(|v| v.is_finite()) {
        return None;
    }
    let p = jacobian.ncols();
    let svd = jacobian
        .clone()
        .try_svd(false, true, f64::EPSILON, SVD_MAX_ITERATIONS)?;
    let v_t = svd.v_t?;

    let mut cov = DMatrix::<f64>::zeros(p, p);
    for (k, &sigma) in svd.singular_values.iter().enumerate() {
        let inv_s2 = 1.0 / (sigma * sigma);
        for i in 0..p {
            for j in 0..p {
                cov[(i, j)] += v_t[(k, i)] * v_t[(k, j)] * inv_s2;
            }
        }
    }
    Some(cov)
}

/// `sqrt(S / (m − p))`, or NaN when there are no degrees of freedom.
pub fn reduced_chi(residual_ss: f64, n_residuals: usize, n_params: usize) -> f64 {
    if n_residuals <= n_params {
        return f64::NAN;
    }
    (residual_ss / (n_residuals - n_params) as f64).sqrt()
}

/// Standard error of each parameter.
pub fn parameter_errors(jacobian: &DMatrix<f64>, residual_ss: f64) -> Vec<f64> {
    let p = jacobian.ncols();
    let c = reduced_chi(residual_ss, jacobian.nrows(), p);
    match normalized_covariance(jacobian) {
        Some(cov) => (0..p).map(|i| c * cov[(i, i)].sqrt()).collect(),
        None => vec![f64::NAN; p],
    }
}
