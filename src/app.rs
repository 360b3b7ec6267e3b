//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - runs the analysis pipeline per image
//! - prints reports/plots
//! - writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use image::ImageFormat;

use crate::cache::ProfileCache;
use crate::cli::{AnalyzeArgs, Command, PlotArgs, SynthArgs};
use crate::detect::DetectorConfig;
use crate::domain::{AnalysisConfig, FitResult, RadialProfile};
use crate::error::AppError;
use crate::io::{AnalysisDocument, AnalysisRecord};
use crate::math::LmConfig;
use crate::models::{LimbLaw, spec};
use crate::preprocess::PreprocessConfig;
use crate::profile::ProfileConfig;
use crate::synth::{DiskScene, render_disk};

pub mod pipeline;

/// Entry point for the `ldark` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    crate::logging::init(&cli.log_level);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Models => handle_models(),
        Command::Synth(args) => handle_synth(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args)?;
    let cache = ProfileCache::global();
    let show_plot = args.plot && !args.no_plot;

    let mut results: Vec<(PathBuf, pipeline::AnalysisOutput)> = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let _span = tracing::info_span!("analyze", image = %path.display()).entered();
        let output = pipeline::analyze_path(path, args.model, cache, &config)?;

        println!("{}", crate::report::format_analysis(&path.display().to_string(), &output));
        if show_plot {
            print_plots(&output.profile, output.best(), args.width, args.height);
        }
        results.push((path.clone(), output));
    }

    // Optional exports.
    if let Some(path) = &args.export_json {
        let records = results
            .iter()
            .map(|(source, output)| AnalysisRecord::from_output(source, output))
            .collect();
        crate::io::write_document_json(path, &AnalysisDocument::new(records))?;
        tracing::info!(path = %path.display(), "analysis JSON written");
    }
    if let Some(path) = &args.export_profile {
        let rows: Vec<(&Path, &pipeline::AnalysisOutput)> =
            results.iter().map(|(p, o)| (p.as_path(), o)).collect();
        crate::io::write_profiles_csv(path, &rows)?;
        tracing::info!(path = %path.display(), "profile CSV written");
    }

    Ok(())
}

fn handle_models() -> Result<(), AppError> {
    print!("{}", crate::report::format_catalog());
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let scene = scene_from_args(&args)?;
    let image = render_disk(&scene);
    image
        .save_with_format(&args.out, ImageFormat::Png)
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", args.out.display())))?;

    println!(
        "Wrote {} ({}x{} px, center=({:.1}, {:.1}), radius={:.1}px, {} {:?})",
        args.out.display(),
        scene.width,
        scene.height,
        scene.center_x,
        scene.center_y,
        scene.radius,
        scene.law.kind(),
        scene.law.coefficients(),
    );
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let document = crate::io::read_document_json(&args.json)?;
    if document.analyses.is_empty() {
        return Err(AppError::input(format!(
            "'{}' contains no analyses.",
            args.json.display()
        )));
    }
    for record in &document.analyses {
        println!("{}", record.source.display());
        print_plots(&record.profile, record.fits.first(), args.width, args.height);
    }
    Ok(())
}

/// Profile plot, then the residual strip of the fit shown in it.
fn print_plots(profile: &RadialProfile, fit: Option<&FitResult>, width: usize, height: usize) {
    println!("{}", crate::plot::render_profile_plot(profile, fit, width, height));
    if let Some(fit) = fit {
        let strip = crate::plot::render_residual_strip(profile, fit, width, (height / 4).max(3));
        if !strip.is_empty() {
            println!("{strip}");
        }
    }
}

/// Translate CLI flags into pipeline configuration.
pub fn analysis_config_from_args(args: &AnalyzeArgs) -> Result<AnalysisConfig, AppError> {
    if !(args.canny_high.is_finite() && args.canny_high > 0.0) {
        return Err(AppError::input("--canny-high must be > 0."));
    }
    if !(args.clip_sigma.is_finite() && args.clip_sigma > 0.0) {
        return Err(AppError::input("--clip-sigma must be > 0."));
    }
    if args.anchor_bins == 0 {
        return Err(AppError::input("--anchor-bins must be >= 1."));
    }
    if args.max_evaluations == 0 {
        return Err(AppError::input("--max-evaluations must be >= 1."));
    }

    Ok(AnalysisConfig {
        preprocess: PreprocessConfig {
            equalize: !args.no_equalize,
            ..PreprocessConfig::default()
        },
        detector: DetectorConfig {
            canny_low: args.canny_high / 2.0,
            canny_high: args.canny_high,
            accumulator_threshold: args.accumulator_threshold,
            ..DetectorConfig::default()
        },
        profile: ProfileConfig {
            clip_sigma: args.clip_sigma,
            anchor_bins: args.anchor_bins,
        },
        solver: LmConfig {
            max_evaluations: args.max_evaluations,
            ..LmConfig::default()
        },
    })
}

/// Build a synthetic scene; missing coefficients fall back to the catalog guess.
pub fn scene_from_args(args: &SynthArgs) -> Result<DiskScene, AppError> {
    let coeffs: Vec<f64> = if args.coeffs.is_empty() {
        spec(args.model).initial_guess.to_vec()
    } else {
        args.coeffs.clone()
    };
    let law = LimbLaw::from_coefficients(args.model, &coeffs).ok_or_else(|| {
        AppError::input(format!(
            "Model '{}' takes {} coefficients, got {}.",
            args.model,
            args.model.param_count(),
            coeffs.len()
        ))
    })?;

    let size = args.size as f64;
    let scene = DiskScene {
        width: args.size,
        height: args.size,
        center_x: size / 2.0,
        center_y: size / 2.0,
        radius: args.radius.unwrap_or(0.35 * size),
        law,
        peak: args.peak,
        background: args.background,
        noise_sigma: args.noise,
        seed: args.seed,
    };
    scene.validate()?;
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::{DetectionMethod, ModelKind, ModelSelector};
    use crate::error::ErrorKind;

    fn analyze_args(extra: &[&str]) -> AnalyzeArgs {
        let mut argv = vec!["ldark", "analyze", "sun.png"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Analyze(args) => args,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn synth_args(extra: &[&str]) -> SynthArgs {
        let mut argv = vec!["ldark", "synth", "--out", "disk.png"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Synth(args) => args,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let config = analysis_config_from_args(&analyze_args(&[])).unwrap();
        let d = DetectorConfig::default();
        assert_eq!(config.detector.canny_high, d.canny_high);
        assert_eq!(config.detector.canny_low, d.canny_low);
        assert_eq!(config.detector.accumulator_threshold, d.accumulator_threshold);
        assert_eq!(config.profile.anchor_bins, 11);
        assert_eq!(config.solver.max_evaluations, 10_000);
        assert!(config.preprocess.equalize);

        let config = analysis_config_from_args(&analyze_args(&["--no-equalize"])).unwrap();
        assert!(!config.preprocess.equalize);
    }

    #[test]
    fn invalid_tuning_flags_are_input_errors() {
        let err = analysis_config_from_args(&analyze_args(&["--anchor-bins", "0"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        let err = analysis_config_from_args(&analyze_args(&["--clip-sigma=-1"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn synth_defaults_to_catalog_guess() {
        let scene = scene_from_args(&synth_args(&["--model", "square-root"])).unwrap();
        assert_eq!(scene.law, LimbLaw::SquareRoot { c: 0.4, d: 0.2 });
        assert_eq!(scene.radius, 0.35 * 256.0);
    }

    #[test]
    fn synth_rejects_wrong_coefficient_count() {
        let err = scene_from_args(&synth_args(&["--model", "claret", "--coeffs", "0.1,0.2"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(err.message().contains("takes 4 coefficients, got 2"));
    }

    #[test]
    fn synthesized_file_analyzes_end_to_end() {
        let path = std::env::temp_dir().join(format!("ldark-e2e-{}.png", std::process::id()));
        let args = synth_args(&["--model", "linear", "--coeffs", "0.6", "--noise", "1.5"]);
        let args = SynthArgs { out: path.clone(), ..args };
        handle_synth(args.clone()).unwrap();

        let config = analysis_config_from_args(&analyze_args(&["--no-equalize"])).unwrap();
        let output = pipeline::analyze_path(&path, ModelSelector::Linear, &ProfileCache::new(), &config);
        std::fs::remove_file(&path).ok();
        let output = output.unwrap();

        let scene = scene_from_args(&args).unwrap();
        assert_eq!(output.disk.method, DetectionMethod::Hough);
        assert!((output.disk.center_x - scene.center_x).abs() < 2.0);
        assert!((output.disk.radius - scene.radius).abs() / scene.radius < 0.03);
        let fit = output.best().unwrap();
        assert_eq!(fit.model, ModelKind::Linear);
        assert!((fit.coefficients[0] - 0.6).abs() < 0.08, "u = {}", fit.coefficients[0]);
    }
}
