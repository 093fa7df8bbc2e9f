//! The fit pipeline shared by the CLI and the tests.
//!
//! ingest -> (initial guess only | full fit with overload refit) -> record
//!
//! Printing and file output stay in `app`; this module only computes.

use tracing::{debug, info};

use crate::domain::{FitConfig, ParameterVector};
use crate::error::AppError;
use crate::fit::{FitOptions, FitReport, SolverOptions, fit_resonance, initial_guess};
use crate::io::ingest::{Ingested, load_samples};
use crate::report::FitRecord;

/// All computed outputs of a single `resfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingested: Ingested,
    /// Set in initial-guess-only mode.
    pub guess: Option<ParameterVector>,
    /// Set when a fit was performed.
    pub report: Option<FitReport>,
    /// `None` when there were fewer samples than parameters.
    pub record: Option<FitRecord>,
}

/// Solver and overload settings derived from the run configuration.
pub fn fit_options(config: &FitConfig) -> FitOptions {
    FitOptions {
        solver: SolverOptions {
            max_iterations: config.max_iterations,
            xtol: config.xtol,
            gtol: config.gtol,
            ftol: config.ftol,
        },
        scaling: config.scaling,
        overload_detection: config.overload_detection,
        overload_fraction: config.overload_fraction,
    }
}

/// Read the input named by `config` and fit it.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let ingested = load_samples(config.input.as_deref())?;
    Ok(fit_ingested(config, ingested))
}

/// Fit already-ingested samples.
pub fn fit_ingested(config: &FitConfig, ingested: Ingested) -> RunOutput {
    let variant = config.variant;
    let samples = &ingested.samples;
    info!(
        variant = %variant,
        samples = samples.len(),
        skipped = ingested.lines_skipped,
        "fitting sweep"
    );

    if samples.len() < variant.param_count() {
        debug!(
            samples = samples.len(),
            params = variant.param_count(),
            "too few samples, no fit"
        );
        return RunOutput {
            ingested,
            guess: None,
            report: None,
            record: None,
        };
    }

    if !config.do_fit {
        let guess = initial_guess(variant, samples);
        let record = FitRecord::from_guess(samples, &guess);
        return RunOutput {
            ingested,
            guess: Some(guess),
            report: None,
            record: Some(record),
        };
    }

    let report = fit_resonance(samples, variant, &fit_options(config));
    let record = report
        .as_ref()
        .map(|report| FitRecord::from_report(samples, report));

    RunOutput {
        ingested,
        guess: None,
        report,
        record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelVariant, OutputFormat, Sample, Scaling};
    use crate::io::ingest::read_samples;
    use crate::models::predict;

    fn config(variant: ModelVariant, do_fit: bool) -> FitConfig {
        FitConfig {
            variant,
            input: None,
            do_fit,
            overload_detection: true,
            overload_fraction: 0.95,
            scaling: Scaling::CenterRange,
            max_iterations: 200,
            xtol: 1e-10,
            gtol: 1e-10,
            ftol: 1e-10,
            format: OutputFormat::Table,
            show_zeros: false,
            require_fit: false,
            export: None,
            debug_dir: None,
        }
    }

    fn sweep_text(variant: ModelVariant, params: &[f64]) -> String {
        (0..41)
            .map(|i| {
                let w = 80.0 + i as f64;
                let (x, y) = predict(variant, params, w);
                format!("{} {w} {x:e} {y:e}\n", 1000.0 + i as f64)
            })
            .collect()
    }

    #[test]
    fn fits_text_input_end_to_end() {
        let truth = [1e-4, -5e-5, 1.0, 0.3, 100.0, 5.0, 2e-6, -1e-6];
        let text = sweep_text(ModelVariant::OscxLoffs, &truth);
        let ingested = read_samples(text.as_bytes()).unwrap();

        let out = fit_ingested(&config(ModelVariant::OscxLoffs, true), ingested);
        let record = out.record.unwrap();
        assert!(record.fitted);
        assert_eq!(record.time, 1020.0);
        assert_eq!(record.parameters.len(), 8);
        let w0 = record.parameters.iter().find(|p| p.name == "w0").unwrap();
        assert!((w0.value - 100.0).abs() < 1e-6, "w0={}", w0.value);
        assert!(out.report.is_some());
    }

    #[test]
    fn no_fit_reports_guess_with_zero_errors() {
        let truth = [0.0, 0.0, 1.0, 0.0, 100.0, 5.0];
        let text = sweep_text(ModelVariant::OscxCoffs, &truth);
        let ingested = read_samples(text.as_bytes()).unwrap();

        let out = fit_ingested(&config(ModelVariant::OscxCoffs, false), ingested);
        let record = out.record.unwrap();
        assert!(!record.fitted);
        assert_eq!(record.residual, 0.0);
        assert!(record.parameters.iter().all(|p| p.error == 0.0));
        assert!((out.guess.unwrap().w0() - 100.0).abs() <= 2.0);
        assert!(out.report.is_none());
    }

    #[test]
    fn too_few_samples_produce_no_record() {
        let ingested = Ingested {
            samples: (0..7).map(|i| Sample::new(i as f64, 100.0 + i as f64, 0.1, 0.2)).collect(),
            lines_read: 7,
            ..Ingested::default()
        };
        let out = fit_ingested(&config(ModelVariant::OscvLoffs, true), ingested);
        assert!(out.record.is_none());
        assert!(out.guess.is_none());
    }

    #[test]
    fn options_follow_config() {
        let mut cfg = config(ModelVariant::OscxCoffs, true);
        cfg.max_iterations = 50;
        cfg.overload_detection = false;
        cfg.scaling = Scaling::Amplitude;
        let opts = fit_options(&cfg);
        assert_eq!(opts.solver.max_iterations, 50);
        assert!(!opts.overload_detection);
        assert_eq!(opts.scaling, Scaling::Amplitude);
    }
}
