//! Building blocks of the damped-oscillator lineshape.
//!
//! For a resonance `(C, D, w0, dw)` probed at frequency `w` we use:
//!
//! ```text
//! wa = w0² − w²      wb = w·dw      z = wa² + wb²
//! p  = (C·wa + D·wb) / z             (in-phase part)
//! q  = (D·wa − C·wb) / z             (quadrature part)
//! ```
//!
//! A coordinate response contributes `(p, q)` to `(X, Y)`; a velocity response
//! is the same term multiplied by `i·w`, i.e. `(−w·q, w·p)`.
//!
//! Numerical notes:
//! - `z` vanishes only for `w = w0` together with `w·dw = 0`; callers keep `w0`
//!   and `dw` away from zero, so no guard is applied here.

/// Denominator pieces at one frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lorentz {
    pub w: f64,
    pub w0: f64,
    pub wa: f64,
    pub wb: f64,
    pub z: f64,
}

impl Lorentz {
    pub fn new(w: f64, w0: f64, dw: f64) -> Self {
        let wa = w0 * w0 - w * w;
        let wb = w * dw;
        Self {
            w,
            w0,
            wa,
            wb,
            z: wa * wa + wb * wb,
        }
    }

    /// In-phase and quadrature parts for drive amplitude `(c, d)`.
    pub fn term(&self, c: f64, d: f64) -> (f64, f64) {
        let p = (c * self.wa + d * self.wb) / self.z;
        let q = (d * self.wa - c * self.wb) / self.z;
        (p, q)
    }

    /// Term value plus its partial derivatives with respect to `(C, D, w0, dw)`.
    pub fn term_with_partials(&self, c: f64, d: f64) -> TermPartials {
        let (p, q) = self.term(c, d);
        let Lorentz { w, w0, wa, wb, z } = *self;

        // dz/dw0 = 4·wa·w0, dz/d(dw) = 2·wb·w
        let dz_w0 = 4.0 * wa * w0;
        let dz_dw = 2.0 * wb * w;

        TermPartials {
            p,
            q,
            dp: [
                wa / z,
                wb / z,
                (2.0 * c * w0 - p * dz_w0) / z,
                (d * w - p * dz_dw) / z,
            ],
            dq: [
                -wb / z,
                wa / z,
                (2.0 * d * w0 - q * dz_w0) / z,
                (-c * w - q * dz_dw) / z,
            ],
        }
    }
}

/// One resonance term and its gradient, ordered `(C, D, w0, dw)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermPartials {
    pub p: f64,
    pub q: f64,
    pub dp: [f64; 4],
    pub dq: [f64; 4],
}

impl TermPartials {
    /// Multiply the term by `i·w` (coordinate → velocity response).
    pub fn to_velocity(self, w: f64) -> Self {
        let mut dp = [0.0; 4];
        let mut dq = [0.0; 4];
        for k in 0..4 {
            dp[k] = -w * self.dq[k];
            dq[k] = w * self.dp[k];
        }
        Self {
            p: -w * self.q,
            q: w * self.p,
            dp,
            dq,
        }
    }
}
