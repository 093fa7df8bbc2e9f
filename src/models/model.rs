//! Model evaluation for OSCX / OSCV / DOSCX / DOSCV.
//!
//! The solver relies on two primitive operations:
//! - the residual vector `f[2i] = real_i − X(w_i)`, `f[2i+1] = imag_i − Y(w_i)`
//! - the Jacobian of that vector, i.e. the derivatives of `−X`, `−Y`
//!
//! Both are implemented here for each variant, side by side, so that the
//! analytic derivatives can be read against the model formulas.

use nalgebra::{DMatrix, DVector};

use crate::domain::{ModelVariant, Response, Sample};
use crate::math::{Lorentz, TermPartials};

/// Predict `(X(w), Y(w))` for the given variant.
///
/// # Panics
/// Panics if `params` is shorter than `variant.param_count()`.
pub fn predict(variant: ModelVariant, params: &[f64], w: f64) -> (f64, f64) {
    let (a, b, c, d, w0, dw) = (params[0], params[1], params[2], params[3], params[4], params[5]);
    let response = variant.response();

    let (mut x, mut y) = respond(Lorentz::new(w, w0, dw).term(c, d), response, w);

    match variant {
        ModelVariant::OscxCoffs | ModelVariant::OscvCoffs => {}
        ModelVariant::OscxLoffs | ModelVariant::OscvLoffs => {
            let (e, f) = (params[6], params[7]);
            x += e * (w - w0);
            y += f * (w - w0);
        }
        ModelVariant::DoscxCoffs | ModelVariant::DoscvCoffs => {
            let (c2, d2, w02, dw2) = (params[6], params[7], params[8], params[9]);
            let (x2, y2) = respond(Lorentz::new(w, w02, dw2).term(c2, d2), response, w);
            x += x2;
            y += y2;
        }
    }

    (a + x, b + y)
}

/// Residual vector of length `2n`, interleaved real/imaginary.
pub fn residuals(variant: ModelVariant, params: &[f64], samples: &[Sample]) -> DVector<f64> {
    let mut f = DVector::<f64>::zeros(2 * samples.len());
    for (i, s) in samples.iter().enumerate() {
        let (x, y) = predict(variant, params, s.freq);
        f[2 * i] = s.real - x;
        f[2 * i + 1] = s.imag - y;
    }
    f
}

/// Jacobian (`2n × p`) of [`residuals`] with respect to the parameters.
///
/// # Panics
/// Panics if `params` is shorter than `variant.param_count()`.
pub fn jacobian(variant: ModelVariant, params: &[f64], samples: &[Sample]) -> DMatrix<f64> {
    let p = variant.param_count();
    let (c, d, w0, dw) = (params[2], params[3], params[4], params[5]);
    let response = variant.response();

    let mut jac = DMatrix::<f64>::zeros(2 * samples.len(), p);

    for (i, s) in samples.iter().enumerate() {
        let (rx, ry) = (2 * i, 2 * i + 1);
        let w = s.freq;

        // -dX/dA, -dY/dB
        jac[(rx, 0)] = -1.0;
        jac[(ry, 1)] = -1.0;

        let first = partials(Lorentz::new(w, w0, dw), c, d, response);
        fill_resonance_columns(&mut jac, rx, ry, 2, &first);

        match variant {
            ModelVariant::OscxCoffs | ModelVariant::OscvCoffs => {}
            ModelVariant::OscxLoffs | ModelVariant::OscvLoffs => {
                let (e, f) = (params[6], params[7]);
                // The background E·(w − w0) also depends on w0.
                jac[(rx, 4)] += e;
                jac[(ry, 4)] += f;
                jac[(rx, 6)] = w0 - w;
                jac[(ry, 7)] = w0 - w;
            }
            ModelVariant::DoscxCoffs | ModelVariant::DoscvCoffs => {
                let (c2, d2, w02, dw2) = (params[6], params[7], params[8], params[9]);
                let second = partials(Lorentz::new(w, w02, dw2), c2, d2, response);
                fill_resonance_columns(&mut jac, rx, ry, 6, &second);
            }
        }
    }

    jac
}

fn respond((p, q): (f64, f64), response: Response, w: f64) -> (f64, f64) {
    match response {
        Response::Coordinate => (p, q),
        Response::Velocity => (-w * q, w * p),
    }
}

fn partials(l: Lorentz, c: f64, d: f64, response: Response) -> TermPartials {
    let t = l.term_with_partials(c, d);
    match response {
        Response::Coordinate => t,
        Response::Velocity => t.to_velocity(l.w),
    }
}

/// Write `−∂X`, `−∂Y` of one resonance into columns `first_col..first_col + 4`.
fn fill_resonance_columns(
    jac: &mut DMatrix<f64>,
    rx: usize,
    ry: usize,
    first_col: usize,
    t: &TermPartials,
) {
    for k in 0..4 {
        jac[(rx, first_col + k)] = -t.dp[k];
        jac[(ry, first_col + k)] = -t.dq[k];
    }
}
