//! Starting parameters derived from sweep geometry alone.
//!
//! The heuristic works in the complex (real, imag) plane:
//!
//! 1. the two extreme-frequency samples define a straight background line
//!    (offset `A, B` at their midpoint, slope `E, F` between them)
//! 2. the sample furthest away from that line is the resonance peak (`w0`)
//! 3. the frequency span of samples further than `dmax/√2` is the width (`dw`)
//! 4. the peak excursion gives the drive amplitude `(C, D)`
//!
//! No optimization is involved, so this is cheap enough to run on every window.

use tracing::debug;

use crate::domain::{ModelVariant, ParameterVector, Response, Sample};

/// Estimate starting parameters for `variant`.
///
/// The caller guarantees at least `variant.param_count()` samples (and in
/// practice at least two distinct frequencies). Degenerate sweeps produce
/// non-finite values rather than an error. An empty slice yields zeros.
pub fn initial_guess(variant: ModelVariant, samples: &[Sample]) -> ParameterVector {
    if samples.is_empty() {
        return ParameterVector::zeros(variant);
    }
    let n = samples.len();

    // Points with min/max frequency.
    let mut ifmin = 0;
    let mut ifmax = 0;
    for (i, s) in samples.iter().enumerate() {
        if s.freq < samples[ifmin].freq {
            ifmin = i;
        }
        if s.freq > samples[ifmax].freq {
            ifmax = i;
        }
    }
    let lo = samples[ifmin];
    let hi = samples[ifmax];

    let a = (lo.real + hi.real) / 2.0;
    let b = (lo.imag + hi.imag) / 2.0;
    let e = (hi.real - lo.real) / (hi.freq - lo.freq);
    let f = (hi.imag - lo.imag) / (hi.freq - lo.freq);

    let distance = |s: &Sample| {
        let df = s.freq - lo.freq;
        (s.real - lo.real - df * e).hypot(s.imag - lo.imag - df * f)
    };

    let mut dmax = 0.0;
    let mut imax = 0;
    for (i, s) in samples.iter().enumerate() {
        let d = distance(s);
        if d > dmax {
            dmax = d;
            imax = i;
        }
    }
    let w0 = samples[imax].freq;

    // Half-power span around the peak.
    let threshold = dmax / std::f64::consts::SQRT_2;
    let mut idmin = imax;
    let mut idmax = imax;
    for (i, s) in samples.iter().enumerate() {
        if distance(s) > threshold {
            if s.freq < samples[idmin].freq {
                idmin = i;
            }
            if s.freq > samples[idmax].freq {
                idmax = i;
            }
        }
    }
    if idmin == idmax {
        idmin = idmin.saturating_sub(1);
        if idmax + 1 < n {
            idmax += 1;
        }
    }
    let dw = samples[idmax].freq - samples[idmin].freq;

    // Coordinate-response drive amplitude.
    let peak = samples[imax];
    let c = -w0 * dw * (peak.imag - b);
    let d = w0 * dw * (peak.real - a);

    // The velocity response is the coordinate response times i·w.
    let (c, d) = match variant.response() {
        Response::Coordinate => (c, d),
        Response::Velocity => (d / w0, -c / w0),
    };

    let values = match variant {
        ModelVariant::OscxCoffs | ModelVariant::OscvCoffs => vec![a, b, c, d, w0, dw],
        ModelVariant::OscxLoffs | ModelVariant::OscvLoffs => vec![a, b, c, d, w0, dw, e, f],
        ModelVariant::DoscxCoffs | ModelVariant::DoscvCoffs => {
            vec![a, b, c, d, w0 + dw, dw, c, d, w0 - dw, dw]
        }
    };

    debug!(
        variant = %variant,
        w0,
        dw,
        peak_index = imax,
        "initial guess"
    );

    ParameterVector::from_layout(variant, values)
}
