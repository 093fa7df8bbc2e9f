//! Debug bundle writer for inspecting a single fit.
//!
//! The bundle is a markdown file with the run settings, the normalization,
//! the initial guess, the selected fit and the overload refit decision.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{FitConfig, ParameterVector, Sample};
use crate::error::AppError;
use crate::fit::{FitReport, Normalizer};
use crate::io::ingest::Ingested;
use crate::report::fit_time;

/// Inputs of one bundle.
#[derive(Debug, Clone, Copy)]
pub struct DebugInputs<'a> {
    pub config: &'a FitConfig,
    pub ingested: &'a Ingested,
    /// Starting parameters in physical units.
    pub guess: Option<&'a ParameterVector>,
    pub report: Option<&'a FitReport>,
}

/// Write `resfit_debug_<variant>_<timestamp>.md` into `dir` and return its path.
pub fn write_debug_bundle(dir: &Path, inputs: DebugInputs<'_>) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::usage(format!("Failed to create debug dir '{}': {e}", dir.display()))
    })?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!(
        "resfit_debug_{}_{ts}.md",
        inputs.config.variant.display_name().to_ascii_lowercase()
    ));

    let body = render_bundle(inputs)
        .map_err(|e| AppError::internal(format!("Failed to render debug bundle: {e}")))?;

    let mut file = File::create(&path).map_err(|e| {
        AppError::usage(format!("Failed to create debug file '{}': {e}", path.display()))
    })?;
    file.write_all(body.as_bytes())
        .map_err(|e| AppError::usage(format!("Failed to write debug file: {e}")))?;

    Ok(path)
}

fn render_bundle(inputs: DebugInputs<'_>) -> Result<String, std::fmt::Error> {
    let DebugInputs {
        config,
        ingested,
        guess,
        report,
    } = inputs;
    let samples = &ingested.samples;
    let mut out = String::new();

    writeln!(out, "# resfit debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- variant: {}", config.variant)?;
    writeln!(
        out,
        "- input: {}",
        config
            .input
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string())
    )?;
    writeln!(
        out,
        "- lines: read={}, skipped={}, samples={}",
        ingested.lines_read,
        ingested.lines_skipped,
        samples.len()
    )?;
    writeln!(
        out,
        "- fit: do_fit={}, overload_detection={}, overload_fraction={:.3}, scaling={:?}",
        config.do_fit, config.overload_detection, config.overload_fraction, config.scaling
    )?;
    writeln!(
        out,
        "- solver: max_iterations={}, xtol={:e}, gtol={:e}, ftol={:e}",
        config.max_iterations, config.xtol, config.gtol, config.ftol
    )?;
    writeln!(out, "- fit_time: {:.6}", fit_time(samples))?;

    if !ingested.row_errors.is_empty() {
        writeln!(out, "\n## Skipped lines")?;
        for err in &ingested.row_errors {
            writeln!(out, "- line {}: {}", err.line, err.message)?;
        }
    }

    write_extents(&mut out, samples)?;

    let Some(report) = report else {
        writeln!(out, "\n## Result")?;
        match guess {
            Some(guess) => {
                writeln!(out, "Initial guess only (fitting disabled).")?;
                write_params(&mut out, guess, None)?;
            }
            None => writeln!(
                out,
                "No fit: {} samples for {} parameters.",
                samples.len(),
                config.variant.param_count()
            )?,
        }
        return Ok(out);
    };

    write_normalizer(&mut out, &report.normalizer)?;

    writeln!(out, "\n## Initial guess")?;
    write_params(&mut out, &report.initial, None)?;

    writeln!(out, "\n## Solver")?;
    writeln!(out, "- termination: {}", report.termination)?;
    writeln!(out, "- evaluations: {}", report.evaluations)?;
    writeln!(out, "- full_residual: {:e}", report.full_residual)?;

    writeln!(out, "\n## Overload refit")?;
    match &report.overload {
        Some(o) => {
            writeln!(out, "- kept: {}", o.kept)?;
            writeln!(out, "- rejected: {}", o.rejected)?;
            writeln!(out, "- residual: {:e}", o.residual)?;
            writeln!(out, "- selected: {}", o.selected)?;
        }
        None => writeln!(out, "not performed")?,
    }

    writeln!(out, "\n## Selected fit (residual {:e})", report.result.residual)?;
    write_params(&mut out, &report.result.parameters, Some(&report.result.errors))?;

    Ok(out)
}

fn write_extents(out: &mut String, samples: &[Sample]) -> std::fmt::Result {
    if samples.is_empty() {
        return Ok(());
    }
    let range = |f: fn(&Sample) -> f64| {
        samples
            .iter()
            .map(f)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    };
    writeln!(out, "\n## Data extents")?;
    writeln!(out, "| axis | min | max |")?;
    writeln!(out, "| - | - | - |")?;
    let axes: [(&str, fn(&Sample) -> f64); 3] = [
        ("freq", |s| s.freq),
        ("real", |s| s.real),
        ("imag", |s| s.imag),
    ];
    for (name, f) in axes {
        let (lo, hi) = range(f);
        writeln!(out, "| {name} | {lo:e} | {hi:e} |")?;
    }
    Ok(())
}

fn write_normalizer(out: &mut String, n: &Normalizer) -> std::fmt::Result {
    writeln!(out, "\n## Normalization ({:?})", n.strategy)?;
    writeln!(out, "- real_center: {:e}", n.real_center)?;
    writeln!(out, "- imag_center: {:e}", n.imag_center)?;
    writeln!(out, "- scale: {:e}", n.scale)?;
    writeln!(out, "- freq_scale: {:e}", n.freq_scale)
}

fn write_params(
    out: &mut String,
    params: &ParameterVector,
    errors: Option<&ParameterVector>,
) -> std::fmt::Result {
    writeln!(out, "| param | value | error |")?;
    writeln!(out, "| - | - | - |")?;
    for (i, (name, value)) in params.named().enumerate() {
        match errors {
            Some(errors) => writeln!(out, "| {name} | {value:e} | {:e} |", errors[i])?,
            None => writeln!(out, "| {name} | {value:e} | - |")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelVariant, OutputFormat, Scaling};
    use crate::fit::{FitOptions, fit_resonance};
    use crate::models::predict;

    fn config(variant: ModelVariant) -> FitConfig {
        FitConfig {
            variant,
            input: None,
            do_fit: true,
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

    #[test]
    fn bundle_lists_fit_sections() {
        let truth = [0.0, 0.0, 1.0, 0.0, 100.0, 5.0];
        let samples: Vec<Sample> = (0..21)
            .map(|i| {
                let w = 80.0 + 2.0 * i as f64;
                let (x, y) = predict(ModelVariant::OscxCoffs, &truth, w);
                Sample::new(i as f64, w, x, y)
            })
            .collect();
        let report = fit_resonance(&samples, ModelVariant::OscxCoffs, &FitOptions::default()).unwrap();
        let ingested = Ingested {
            samples,
            lines_read: 21,
            ..Ingested::default()
        };
        let cfg = config(ModelVariant::OscxCoffs);

        let text = render_bundle(DebugInputs {
            config: &cfg,
            ingested: &ingested,
            guess: None,
            report: Some(&report),
        })
        .unwrap();

        assert!(text.contains("- variant: OSCX_COFFS"));
        assert!(text.contains("## Normalization (CenterRange)"));
        assert!(text.contains("## Initial guess"));
        assert!(text.contains("## Overload refit"));
        assert!(text.contains("| w0 |"));
    }

    #[test]
    fn bundle_without_fit_explains_why() {
        let ingested = Ingested {
            samples: vec![Sample::new(0.0, 100.0, 1.0, 0.0)],
            lines_read: 1,
            ..Ingested::default()
        };
        let cfg = config(ModelVariant::OscxLoffs);
        let text = render_bundle(DebugInputs {
            config: &cfg,
            ingested: &ingested,
            guess: None,
            report: None,
        })
        .unwrap();
        assert!(text.contains("No fit: 1 samples for 8 parameters."));
    }
}
