//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs the stderr log subscriber
//! - reads a sweep and fits it (or prints a synthetic one)
//! - prints the result and writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Command, FitArgs, SynthArgs};
use crate::data::{SynthConfig, generate};
use crate::domain::{FitConfig, ModelVariant, ParameterVector, Response};
use crate::error::{AppError, EXIT_NO_FIT};

pub mod pipeline;

/// Entry point for the `resfit` binary.
pub fn run() -> Result<(), AppError> {
    // `resfit < data` and `resfit -p 6 < data` behave like `resfit fit ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_tracing(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Synth(args) => handle_synth(&args),
    }
}

/// Logs go to stderr; stdout carries data only. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (tests, embedding) keeps the existing subscriber.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(args)?;
    let run = pipeline::run_fit(&config)?;

    if let Some(record) = &run.record {
        println!(
            "{}",
            crate::report::render(record, config.format, config.show_zeros)?
        );
        if let Some(path) = &config.export {
            crate::io::export::write_record_json(path, record)?;
        }
    }

    if let Some(dir) = &config.debug_dir {
        let path = crate::debug::write_debug_bundle(
            dir,
            crate::debug::DebugInputs {
                config: &config,
                ingested: &run.ingested,
                guess: run.guess.as_ref(),
                report: run.report.as_ref(),
            },
        )?;
        info!(path = %path.display(), "wrote debug bundle");
    }

    if run.record.is_none() && config.require_fit {
        return Err(AppError::new(
            EXIT_NO_FIT,
            format!(
                "No fit: {} samples for {} parameters.",
                run.ingested.samples.len(),
                config.variant.param_count()
            ),
        ));
    }

    Ok(())
}

fn handle_synth(args: &SynthArgs) -> Result<(), AppError> {
    let variant = variant_from_layout(args.pars, args.response)?;
    let params = ParameterVector::from_values(variant, args.params.clone()).ok_or_else(|| {
        AppError::usage(format!(
            "{variant} expects {} parameters ({}), got {}.",
            variant.param_count(),
            variant.param_names().join(","),
            args.params.len()
        ))
    })?;

    let samples = generate(&SynthConfig {
        params,
        f_min: args.f_min,
        f_max: args.f_max,
        count: args.count,
        noise: args.noise,
        seed: args.seed,
        clip: args.clip,
        t0: args.t0,
        dt: args.dt,
    })?;

    for s in &samples {
        println!("{} {} {:e} {:e}", s.time, s.freq, s.real, s.imag);
    }
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    let variant = variant_from_layout(args.pars, args.response)?;

    if !(args.overload_fraction > 0.0 && args.overload_fraction <= 1.0) {
        return Err(AppError::usage(format!(
            "--overload-fraction must be in (0, 1], got {}.",
            args.overload_fraction
        )));
    }
    if args.max_iter == 0 {
        return Err(AppError::usage("--max-iter must be at least 1."));
    }

    Ok(FitConfig {
        variant,
        input: args.input.clone(),
        do_fit: !args.no_fit,
        overload_detection: !args.no_overload,
        overload_fraction: args.overload_fraction,
        scaling: args.scaling,
        max_iterations: args.max_iter,
        xtol: args.xtol,
        gtol: args.gtol,
        ftol: args.ftol,
        format: args.format,
        show_zeros: args.show_zeros,
        require_fit: args.require_fit,
        export: args.export.clone(),
        debug_dir: args.debug_dir.clone(),
    })
}

fn variant_from_layout(
    pars: usize,
    response: Response,
) -> Result<ModelVariant, AppError> {
    ModelVariant::from_layout(pars, response).ok_or_else(|| {
        AppError::usage(format!(
            "Unsupported parameter count {pars}: expected 6, 8 or 10."
        ))
    })
}

/// Rewrite argv so `resfit` defaults to `resfit fit`.
///
/// Rules:
/// - `resfit`                      -> `resfit fit`
/// - `resfit -p 6 ...`             -> `resfit fit -p 6 ...`
/// - `resfit --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "synth");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "fit flags".
    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
