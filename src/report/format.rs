//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the detection/fitting code stays clean and testable
//! - output changes are localized (the tables below are covered by tests)

use crate::app::pipeline::AnalysisOutput;
use crate::domain::{FitResult, ModelKind};
use crate::models::{CATALOG, spec};

/// Format the full per-image summary (geometry + profile + fits).
pub fn format_analysis(source: &str, output: &AnalysisOutput) -> String {
    let mut out = String::new();

    out.push_str("=== ldark - Limb-Darkening Analysis ===\n");
    out.push_str(&format!("Image: {source}\n"));
    out.push_str(&format!(
        "SHA-256: {}{}\n",
        output.image_hash,
        if output.cache_hit { " (cached profile)" } else { "" }
    ));
    let d = &output.disk;
    out.push_str(&format!(
        "Disk: center=({:.2}, {:.2}) radius={:.2}px | method={:?}\n",
        d.center_x, d.center_y, d.radius, d.method
    ));
    out.push_str(&format!("Profile: {}\n", profile_line(output)));
    out.push_str(&format!("Request: {}\n", output.selector.name()));

    if output.fits.len() > 1 {
        out.push_str("\nModel comparison (R² descending):\n");
        out.push_str(&format_comparison(&output.fits));
    }
    for (kind, reason) in &output.skipped {
        out.push_str(&format!("  (skipped {}) {reason}\n", kind.display_name()));
    }

    match output.best() {
        Some(best) => {
            out.push_str(if output.fits.len() > 1 { "\nBest model:\n" } else { "\nFit:\n" });
            out.push_str(&format_fit(best));
        }
        None => out.push_str("\nNo model could be fitted to this profile.\n"),
    }

    out
}

fn profile_line(output: &AnalysisOutput) -> String {
    let p = &output.profile;
    let (i_min, i_max) = p
        .intensity()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    match (p.mu().first(), p.mu().last()) {
        (Some(mu_lo), Some(mu_hi)) => format!(
            "n={} | mu=[{mu_lo:.3}, {mu_hi:.3}] | I=[{i_min:.3}, {i_max:.3}]",
            p.len()
        ),
        _ => "n=0".to_string(),
    }
}

/// Coefficients with uncertainties and goodness of fit for one model.
pub fn format_fit(fit: &FitResult) -> String {
    let entry = spec(fit.model);
    let mut out = String::new();
    out.push_str(&format!("- {}: I(mu)/I(1) = {}\n", fit.model.display_name(), entry.formula));
    for ((name, value), se) in entry
        .param_names
        .iter()
        .zip(&fit.coefficients)
        .zip(&fit.standard_errors)
    {
        out.push_str(&format!("  {name:<3} = {value:>10.6} ± {}\n", fmt_err(*se)));
    }
    out.push_str(&format!(
        "  R² = {:.6} | reduced χ² = {:.4}\n",
        fit.r_squared, fit.reduced_chi_square
    ));
    out
}

/// Ranked comparison table. Rows are printed in the given order.
pub fn format_comparison(fits: &[FitResult]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<4} {:<18} {:>10} {:>12} {}\n",
            "rank", "model", "R²", "red. χ²", "coefficients"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<4} {:-<18} {:-<10} {:-<12} {:-<12}", "", "", "", "", "").trim_end());
    out.push('\n');

    for (i, fit) in fits.iter().enumerate() {
        out.push_str(
            format!(
                "{:<4} {:<18} {:>10.6} {:>12.4} {}",
                i + 1,
                truncate(fit.model.display_name(), 18),
                fit.r_squared,
                fit.reduced_chi_square,
                fmt_vec(&fit.coefficients),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Catalog listing for `ldark models`.
pub fn format_catalog() -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:<12} {:<24} {}\n",
        "model", "params", "initial guess", "I(mu)/I(1)"
    ));
    for entry in CATALOG.iter() {
        out.push_str(
            format!(
                "{:<12} {:<12} {:<24} {}",
                entry.kind.name(),
                entry.param_names.join(","),
                fmt_guess(entry.initial_guess),
                entry.formula,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push_str(&format!(
        "\nUse `--model <name>` or `--model compare` to fit all {} and rank by R².\n",
        ModelKind::ALL.len()
    ));
    out
}

fn fmt_err(se: f64) -> String {
    if se.is_finite() { format!("{se:.6}") } else { "inf".to_string() }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

fn fmt_guess(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetectionMethod, Disk, ModelSelector, RadialProfile};

    fn fit(model: ModelKind, r_squared: f64, coefficients: Vec<f64>) -> FitResult {
        let n = coefficients.len();
        FitResult {
            model,
            formula: String::new(),
            coefficients,
            standard_errors: vec![0.001; n],
            r_squared,
            reduced_chi_square: 1.25,
            fitted_curve: vec![],
            residuals: vec![],
        }
    }

    fn output(fits: Vec<FitResult>) -> AnalysisOutput {
        AnalysisOutput {
            image_hash: "0123".to_string(),
            selector: ModelSelector::Compare,
            disk: Disk {
                center_x: 128.0,
                center_y: 127.5,
                radius: 90.25,
                method: DetectionMethod::Hough,
            },
            profile: RadialProfile::new(vec![0.0, 0.5, 1.0], vec![0.3, 0.8, 1.0]).unwrap(),
            fits,
            skipped: vec![(ModelKind::Claret, "Too few samples".to_string())],
            cache_hit: true,
        }
    }

    #[test]
    fn comparison_table_golden() {
        let fits = vec![
            fit(ModelKind::Quadratic, 0.999, vec![0.4, 0.2]),
            fit(ModelKind::Linear, 0.95, vec![0.6]),
        ];
        let expected = concat!(
            "rank model                      R²      red. χ² coefficients\n",
            "---- ------------------ ---------- ------------ ------------\n",
            "1    Quadratic            0.999000       1.2500 [0.4000, 0.2000]\n",
            "2    Linear               0.950000       1.2500 [0.6000]\n",
        );
        assert_eq!(format_comparison(&fits), expected);
    }

    #[test]
    fn summary_mentions_geometry_best_model_and_skips() {
        let txt = format_analysis(
            "sun.png",
            &output(vec![
                fit(ModelKind::Quadratic, 0.999, vec![0.4, 0.2]),
                fit(ModelKind::Linear, 0.95, vec![0.6]),
            ]),
        );
        assert!(txt.contains("Image: sun.png"));
        assert!(txt.contains("(cached profile)"));
        assert!(txt.contains("Disk: center=(128.00, 127.50) radius=90.25px | method=Hough"));
        assert!(txt.contains("Profile: n=3 | mu=[0.000, 1.000] | I=[0.300, 1.000]"));
        assert!(txt.contains("(skipped Claret (4-param)) Too few samples"));
        assert!(txt.contains("Best model:\n- Quadratic"));
        assert!(txt.contains("  a   =   0.400000 ± 0.001000"));
    }

    #[test]
    fn empty_compare_run_says_so() {
        let txt = format_analysis("x.png", &output(vec![]));
        assert!(txt.contains("No model could be fitted"));
    }

    #[test]
    fn infinite_uncertainty_prints_as_inf() {
        let mut f = fit(ModelKind::Linear, 1.0, vec![0.5]);
        f.standard_errors = vec![f64::INFINITY];
        assert!(format_fit(&f).contains("± inf"));
    }

    #[test]
    fn catalog_lists_every_model() {
        let txt = format_catalog();
        for kind in ModelKind::ALL {
            assert!(txt.contains(kind.name()), "missing {kind}");
        }
        assert!(txt.contains("[0.5, -0.1, 0.4, -0.2]"));
    }
}
