//! Command-line parsing for the resonance fitter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code. Everything here is converted into plain config values in
//! `app` before any work starts.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{OutputFormat, Response, Scaling};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "resfit", version, about = "Lorentzian resonance fitter for frequency sweeps")]
pub struct Cli {
    /// Log fit diagnostics to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit one sweep read as `time freq real imag` lines (the default command).
    Fit(FitArgs),
    /// Print a synthetic sweep in the same line format.
    Synth(SynthArgs),
}

/// Options for fitting a sweep.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Number of model parameters: 6 (constant offset), 8 (linear background)
    /// or 10 (two resonances).
    #[arg(short = 'p', long, default_value_t = 8)]
    pub pars: usize,

    /// Measured quantity.
    #[arg(long, value_enum, default_value_t = Response::Coordinate)]
    pub response: Response,

    /// Read samples from a file instead of stdin.
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Only print the initial guess (zero errors, zero residual).
    #[arg(long)]
    pub no_fit: bool,

    /// Disable the refit without overloaded samples.
    #[arg(long)]
    pub no_overload: bool,

    /// Fraction of the per-axis maximum above which a sample counts as overloaded.
    #[arg(long, default_value_t = 0.95)]
    pub overload_fraction: f64,

    /// Data normalization applied before solving.
    #[arg(long, value_enum, default_value_t = Scaling::CenterRange)]
    pub scaling: Scaling,

    /// Solver iteration cap.
    #[arg(long = "max-iter", default_value_t = 200)]
    pub max_iter: usize,

    /// Relative step-size tolerance.
    #[arg(long, default_value_t = 1e-10)]
    pub xtol: f64,

    /// Gradient tolerance.
    #[arg(long, default_value_t = 1e-10)]
    pub gtol: f64,

    /// Relative sum-of-squares tolerance.
    #[arg(long, default_value_t = 1e-10)]
    pub ftol: f64,

    /// Output layout.
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pad table output with `0 0` pairs up to 10 parameters.
    #[arg(long)]
    pub show_zeros: bool,

    /// Exit with code 3 when there are too few samples to fit.
    #[arg(long)]
    pub require_fit: bool,

    /// Also write the fit record as JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Write a markdown debug bundle into this directory.
    #[arg(long, value_name = "DIR")]
    pub debug_dir: Option<PathBuf>,
}

/// Options for generating a synthetic sweep.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Number of model parameters (6, 8 or 10).
    #[arg(short = 'p', long, default_value_t = 6)]
    pub pars: usize,

    /// Measured quantity.
    #[arg(long, value_enum, default_value_t = Response::Coordinate)]
    pub response: Response,

    /// True parameters, comma separated in layout order (`A,B,C,D,w0,dw[,...]`).
    #[arg(
        long,
        value_delimiter = ',',
        required = true,
        allow_hyphen_values = true,
        value_name = "LIST"
    )]
    pub params: Vec<f64>,

    /// Lowest frequency.
    #[arg(long)]
    pub f_min: f64,

    /// Highest frequency.
    #[arg(long)]
    pub f_max: f64,

    /// Number of samples.
    #[arg(short = 'n', long, default_value_t = 51)]
    pub count: usize,

    /// Standard deviation of Gaussian noise added to each axis.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Clip both axes at this fraction of their largest magnitude.
    #[arg(long)]
    pub clip: Option<f64>,

    /// Timestamp of the first sample.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub t0: f64,

    /// Time step between samples.
    #[arg(long, default_value_t = 1.0)]
    pub dt: f64,
}
