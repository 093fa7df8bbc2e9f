//! Data normalization before solving, and the inverse mapping of parameters.
//!
//! The solver's step-size and convergence heuristics assume order-one
//! quantities. Raw sweeps may be in volts, amperes or arbitrary ADC units, with
//! frequencies anywhere from Hz to MHz, so every fit runs on scaled data:
//!
//! ```text
//! real' = (real − real_center) / scale
//! imag' = (imag − imag_center) / scale
//! w'    = w / freq_scale
//! ```
//!
//! Parameters then map back with variant-aware powers of `freq_scale`, derived
//! directly from the model formulas:
//!
//! | parameter        | coordinate      | velocity       |
//! |------------------|-----------------|----------------|
//! | `A`, `B`         | `s` (+ center)  | `s` (+ center) |
//! | `C`, `D`, `C2`, `D2` | `s·sf²`     | `s·sf`         |
//! | `w0`, `dw`, `w02`, `dw2` | `sf`    | `sf`           |
//! | `E`, `F`         | `s/sf`          | `s/sf`         |

use crate::domain::{ModelVariant, ParameterVector, Response, Sample, Scaling};

/// Scale and offsets of one normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    pub strategy: Scaling,
    pub real_center: f64,
    pub imag_center: f64,
    /// Common scale `s` of the real and imaginary axes.
    pub scale: f64,
    /// Frequency scale `sf`.
    pub freq_scale: f64,
}

impl Normalizer {
    pub fn identity() -> Self {
        Self {
            strategy: Scaling::None,
            real_center: 0.0,
            imag_center: 0.0,
            scale: 1.0,
            freq_scale: 1.0,
        }
    }

    /// Derive the normalization for a sample set.
    ///
    /// Degenerate extents (zero or non-finite) fall back to a scale of 1 so the
    /// mapping stays invertible.
    pub fn from_samples(samples: &[Sample], strategy: Scaling) -> Self {
        if samples.is_empty() {
            return Self {
                strategy,
                ..Self::identity()
            };
        }

        let ext = Extents::of(samples);
        let freq_scale = usable((ext.freq_max + ext.freq_min) / 2.0).unwrap_or(1.0);

        match strategy {
            Scaling::None => Self::identity(),
            Scaling::CenterRange => {
                let real_range = ext.real_max - ext.real_min;
                let imag_range = ext.imag_max - ext.imag_min;
                let scale = usable(real_range.min(imag_range))
                    .or_else(|| usable(real_range.max(imag_range)))
                    .unwrap_or(1.0);
                Self {
                    strategy,
                    real_center: (ext.real_max + ext.real_min) / 2.0,
                    imag_center: (ext.imag_max + ext.imag_min) / 2.0,
                    scale,
                    freq_scale,
                }
            }
            Scaling::Amplitude => {
                let amplitude = ext
                    .real_max
                    .abs()
                    .max(ext.real_min.abs())
                    .max(ext.imag_max.abs())
                    .max(ext.imag_min.abs());
                Self {
                    strategy,
                    real_center: 0.0,
                    imag_center: 0.0,
                    scale: usable(amplitude).unwrap_or(1.0),
                    freq_scale,
                }
            }
        }
    }

    pub fn normalize_samples(&self, samples: &[Sample]) -> Vec<Sample> {
        samples
            .iter()
            .map(|s| Sample {
                time: s.time,
                freq: s.freq / self.freq_scale,
                real: (s.real - self.real_center) / self.scale,
                imag: (s.imag - self.imag_center) / self.scale,
            })
            .collect()
    }

    /// Map physical-unit parameters into normalized units.
    pub fn normalize_params(&self, params: &ParameterVector) -> ParameterVector {
        let factors = self.unit_factors(params.variant());
        let mut out = params.clone();
        for (i, v) in out.as_mut_slice().iter_mut().enumerate() {
            *v = (*v - self.shift(i)) / factors[i];
        }
        out
    }

    /// Map normalized parameters back to physical units.
    pub fn denormalize_params(&self, params: &ParameterVector) -> ParameterVector {
        let factors = self.unit_factors(params.variant());
        let mut out = params.clone();
        for (i, v) in out.as_mut_slice().iter_mut().enumerate() {
            *v = *v * factors[i] + self.shift(i);
        }
        out
    }

    /// Map parameter uncertainties back to physical units (no offset shift).
    pub fn denormalize_errors(&self, errors: &ParameterVector) -> ParameterVector {
        let factors = self.unit_factors(errors.variant());
        let mut out = errors.clone();
        for (i, v) in out.as_mut_slice().iter_mut().enumerate() {
            *v *= factors[i];
        }
        out
    }

    pub fn denormalize_residual(&self, residual: f64) -> f64 {
        residual * self.scale
    }

    /// Multiplicative factor from normalized to physical units, per parameter.
    pub fn unit_factors(&self, variant: ModelVariant) -> Vec<f64> {
        let s = self.scale;
        let sf = self.freq_scale;
        let amplitude = match variant.response() {
            Response::Coordinate => s * sf * sf,
            Response::Velocity => s * sf,
        };

        let mut factors = vec![s, s, amplitude, amplitude, sf, sf];
        if variant.is_double() {
            factors.extend_from_slice(&[amplitude, amplitude, sf, sf]);
        } else if variant.has_linear_background() {
            factors.extend_from_slice(&[s / sf, s / sf]);
        }
        factors
    }

    fn shift(&self, index: usize) -> f64 {
        match index {
            0 => self.real_center,
            1 => self.imag_center,
            _ => 0.0,
        }
    }
}

struct Extents {
    real_min: f64,
    real_max: f64,
    imag_min: f64,
    imag_max: f64,
    freq_min: f64,
    freq_max: f64,
}

impl Extents {
    fn of(samples: &[Sample]) -> Self {
        let mut ext = Extents {
            real_min: f64::INFINITY,
            real_max: f64::NEG_INFINITY,
            imag_min: f64::INFINITY,
            imag_max: f64::NEG_INFINITY,
            freq_min: f64::INFINITY,
            freq_max: f64::NEG_INFINITY,
        };
        for s in samples {
            ext.real_min = ext.real_min.min(s.real);
            ext.real_max = ext.real_max.max(s.real);
            ext.imag_min = ext.imag_min.min(s.imag);
            ext.imag_max = ext.imag_max.max(s.imag);
            ext.freq_min = ext.freq_min.min(s.freq);
            ext.freq_max = ext.freq_max.max(s.freq);
        }
        ext
    }
}

fn usable(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::predict;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new(0.0, 90.0, 1.0, 10.0),
            Sample::new(1.0, 100.0, 3.0, 14.0),
            Sample::new(2.0, 110.0, 2.0, 12.0),
        ]
    }

    #[test]
    fn center_range_uses_smaller_range() {
        let n = Normalizer::from_samples(&samples(), Scaling::CenterRange);
        assert_eq!(n.real_center, 2.0);
        assert_eq!(n.imag_center, 12.0);
        assert_eq!(n.scale, 2.0);
        assert_eq!(n.freq_scale, 100.0);

        let scaled = n.normalize_samples(&samples());
        assert_eq!(scaled[1].freq, 1.0);
        assert_eq!(scaled[1].real, 0.5);
        assert_eq!(scaled[0].imag, -1.0);
        assert_eq!(scaled[2].time, 2.0);
    }

    #[test]
    fn flat_axis_falls_back_to_other_range() {
        let flat: Vec<Sample> = samples()
            .into_iter()
            .map(|s| Sample { imag: 5.0, ..s })
            .collect();
        let n = Normalizer::from_samples(&flat, Scaling::CenterRange);
        assert_eq!(n.scale, 2.0);
    }

    #[test]
    fn amplitude_scaling_does_not_center() {
        let n = Normalizer::from_samples(&samples(), Scaling::Amplitude);
        assert_eq!(n.real_center, 0.0);
        assert_eq!(n.scale, 14.0);
    }

    #[test]
    fn params_round_trip() {
        let n = Normalizer::from_samples(&samples(), Scaling::CenterRange);
        for variant in ModelVariant::ALL {
            let values: Vec<f64> = (0..variant.param_count()).map(|i| 1.0 + i as f64).collect();
            let p = ParameterVector::from_values(variant, values).unwrap();
            let back = n.denormalize_params(&n.normalize_params(&p));
            for (a, b) in p.as_slice().iter().zip(back.as_slice()) {
                assert!((a - b).abs() < 1e-12 * a.abs().max(1.0));
            }
        }
    }

    #[test]
    fn denormalized_model_matches_scaled_model() {
        // Evaluating the normalized model at w' and mapping back must equal the
        // physical model at w, which pins down the per-variant unit powers.
        let n = Normalizer {
            strategy: Scaling::CenterRange,
            real_center: 0.3,
            imag_center: -0.2,
            scale: 0.01,
            freq_scale: 50.0,
        };
        for variant in ModelVariant::ALL {
            let mut values = vec![0.1, -0.2, 0.5, 0.3, 1.0, 0.1];
            if variant.is_double() {
                values.extend_from_slice(&[0.4, -0.2, 1.15, 0.07]);
            } else if variant.has_linear_background() {
                values.extend_from_slice(&[0.2, -0.1]);
            }
            let scaled = ParameterVector::from_values(variant, values).unwrap();
            let physical = n.denormalize_params(&scaled);

            for &w in &[0.8, 0.97, 1.0, 1.1, 1.3] {
                let (xs, ys) = predict(variant, scaled.as_slice(), w);
                let (xp, yp) = predict(variant, physical.as_slice(), w * n.freq_scale);
                let xs_phys = xs * n.scale + n.real_center;
                let ys_phys = ys * n.scale + n.imag_center;
                assert!((xs_phys - xp).abs() < 1e-12, "{variant} X at {w}");
                assert!((ys_phys - yp).abs() < 1e-12, "{variant} Y at {w}");
            }
        }
    }

    #[test]
    fn errors_are_not_shifted() {
        let n = Normalizer::from_samples(&samples(), Scaling::CenterRange);
        let e = ParameterVector::from_values(ModelVariant::OscxCoffs, vec![1.0; 6]).unwrap();
        let back = n.denormalize_errors(&e);
        assert_eq!(back[0], 2.0);
        assert_eq!(back[2], 2.0 * 100.0 * 100.0);
        assert_eq!(back[4], 100.0);
    }
}
