//! Export radial profiles to CSV.
//!
//! One row per profile sample, with the best fit alongside when there is one,
//! so the file can be plotted directly in a spreadsheet.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::app::pipeline::AnalysisOutput;
use crate::error::AppError;

const HEADER: [&str; 7] = ["source", "image_sha256", "mu", "intensity", "best_model", "fitted", "residual"];

/// Write every analyzed profile to one CSV file.
pub fn write_profiles_csv(path: &Path, analyses: &[(&Path, &AnalysisOutput)]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create profile CSV '{}': {e}", path.display())))?;
    write_profiles(file, analyses).map_err(|e| AppError::io(format!("Failed to write profile CSV: {e}")))
}

fn write_profiles<W: Write>(out: W, analyses: &[(&Path, &AnalysisOutput)]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;

    for (source, analysis) in analyses {
        let source = source.display().to_string();
        let best = analysis.best();
        for (i, (mu, intensity)) in analysis.profile.points().enumerate() {
            let (model, fitted, residual) = match best {
                Some(fit) => (
                    fit.model.name(),
                    format!("{:.8}", fit.fitted_curve[i]),
                    format!("{:.8}", fit.residuals[i]),
                ),
                None => ("", String::new(), String::new()),
            };
            let mu = format!("{mu:.8}");
            let intensity = format!("{intensity:.8}");
            writer.write_record([
                source.as_str(),
                analysis.image_hash.as_str(),
                mu.as_str(),
                intensity.as_str(),
                model,
                fitted.as_str(),
                residual.as_str(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
