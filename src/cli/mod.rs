//! Command-line parsing for the limb-darkening analyser.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! detection/fitting code. Only `app` turns these structs into pipeline config.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{ModelKind, ModelSelector};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ldark", version, about = "Stellar limb-darkening analyser")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. `info`, `limb_darkening=debug`).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Locate the disk, extract its radial profile and fit limb-darkening laws.
    Analyze(AnalyzeArgs),
    /// Print the model catalog.
    Models,
    /// Render a synthetic limb-darkened disk to a PNG.
    Synth(SynthArgs),
    /// Re-plot profiles and best fits from a JSON file written by `analyze --export-json`.
    Plot(PlotArgs),
}

/// Options for `ldark analyze`.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// PNG/JPEG images to analyze. Identical files reuse the cached profile.
    #[arg(required = true, value_name = "IMAGE")]
    pub images: Vec<PathBuf>,

    /// Model to fit, or `compare` to fit and rank all of them.
    #[arg(short = 'm', long, value_enum, default_value_t = ModelSelector::Compare)]
    pub model: ModelSelector,

    /// Render an ASCII profile plot (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export disk, profile and fits for every image to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export the radial profiles to CSV.
    #[arg(long = "export-profile", value_name = "CSV")]
    pub export_profile: Option<PathBuf>,

    /// Skip local contrast equalization (keeps raw intensities for fitting).
    #[arg(long)]
    pub no_equalize: bool,

    /// Canny high hysteresis threshold (the low threshold is half of it).
    #[arg(long, default_value_t = 50.0)]
    pub canny_high: f32,

    /// Minimum circle-voting support.
    #[arg(long, default_value_t = 30)]
    pub accumulator_threshold: u32,

    /// Sigma-clipping multiplier per radius bin.
    #[arg(long, default_value_t = 3.0)]
    pub clip_sigma: f64,

    /// Innermost bins averaged into the central-intensity anchor.
    #[arg(long, default_value_t = 11)]
    pub anchor_bins: usize,

    /// Solver budget (residual + Jacobian evaluations) per model.
    #[arg(long, default_value_t = 10_000)]
    pub max_evaluations: usize,
}

/// Options for `ldark synth`.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output PNG path.
    #[arg(short, long, value_name = "PNG")]
    pub out: PathBuf,

    /// Image width and height (pixels).
    #[arg(long, default_value_t = 256)]
    pub size: u32,

    /// Disk radius in pixels (default: 35% of the size).
    #[arg(long)]
    pub radius: Option<f64>,

    /// Law used to shade the disk.
    #[arg(long, value_enum, default_value_t = ModelKind::Quadratic)]
    pub model: ModelKind,

    /// Comma-separated coefficients (default: the catalog initial guess).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub coeffs: Vec<f64>,

    /// Sky level outside the disk.
    #[arg(long, default_value_t = 12.0)]
    pub background: f64,

    /// Pixel value at the disk center.
    #[arg(long, default_value_t = 220.0)]
    pub peak: f64,

    /// Gaussian noise sigma (pixel units).
    #[arg(long, default_value_t = 2.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for plotting a saved analysis.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Analysis JSON produced by `ldark analyze --export-json`.
    #[arg(long, value_name = "JSON")]
    pub json: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}
