//! Read/write analysis documents (JSON).
//!
//! An analysis document is the portable record of one `ldark analyze` run:
//! - per image: content hash, disk geometry, radial profile
//! - every fit (coefficients, uncertainties, statistics, fitted curve)
//! - skipped models with reasons, and the best law as named parameters

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::pipeline::AnalysisOutput;
use crate::domain::{Disk, FitResult, ModelKind, ModelSelector, RadialProfile};
use crate::error::AppError;
use crate::models::LimbLaw;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub analyses: Vec<AnalysisRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub source: PathBuf,
    pub image_sha256: String,
    pub selector: ModelSelector,
    pub disk: Disk,
    pub profile: RadialProfile,
    pub fits: Vec<FitResult>,
    pub skipped: Vec<SkippedModel>,
    /// Best fit by R², as named parameters.
    pub best_law: Option<LimbLaw>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedModel {
    pub model: ModelKind,
    pub reason: String,
}

impl AnalysisRecord {
    pub fn from_output(source: &Path, output: &AnalysisOutput) -> Self {
        Self {
            source: source.to_path_buf(),
            image_sha256: output.image_hash.clone(),
            selector: output.selector,
            disk: output.disk,
            profile: output.profile.clone(),
            fits: output.fits.clone(),
            skipped: output
                .skipped
                .iter()
                .map(|(model, reason)| SkippedModel {
                    model: *model,
                    reason: reason.clone(),
                })
                .collect(),
            best_law: output.best().and_then(LimbLaw::from_fit),
        }
    }
}

impl AnalysisDocument {
    pub fn new(analyses: Vec<AnalysisRecord>) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            analyses,
        }
    }
}

/// Write an analysis document as pretty JSON.
pub fn write_document_json(path: &Path, document: &AnalysisDocument) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, document)
        .map_err(|e| AppError::io(format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

/// Read an analysis document back.
pub fn read_document_json(path: &Path) -> Result<AnalysisDocument, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open analysis JSON '{}': {e}", path.display())))?;
    let document: AnalysisDocument =
        serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid analysis JSON: {e}")))?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DetectionMethod;

    fn sample_output() -> AnalysisOutput {
        let fit = FitResult {
            model: ModelKind::Quadratic,
            formula: "q".to_string(),
            coefficients: vec![0.41, 0.19],
            standard_errors: vec![0.01, f64::INFINITY],
            r_squared: 0.998,
            reduced_chi_square: 1.02,
            fitted_curve: vec![0.4, 1.0],
            residuals: vec![0.0, 0.0],
        };
        AnalysisOutput {
            image_hash: "ab".repeat(32),
            selector: ModelSelector::Compare,
            disk: Disk {
                center_x: 128.2,
                center_y: 127.9,
                radius: 90.1,
                method: DetectionMethod::Hough,
            },
            profile: RadialProfile::new(vec![0.0, 1.0], vec![0.4, 1.0]).unwrap(),
            fits: vec![fit],
            skipped: vec![(ModelKind::Claret, "Too few samples".to_string())],
            cache_hit: false,
        }
    }

    #[test]
    fn record_carries_best_law_and_skips() {
        let record = AnalysisRecord::from_output(Path::new("sun.png"), &sample_output());
        assert_eq!(record.best_law, Some(LimbLaw::Quadratic { a: 0.41, b: 0.19 }));
        assert_eq!(record.skipped[0].model, ModelKind::Claret);
    }

    #[test]
    fn document_json_uses_wire_names() {
        let doc = AnalysisDocument::new(vec![AnalysisRecord::from_output(
            Path::new("sun.png"),
            &sample_output(),
        )]);
        let value = serde_json::to_value(&doc).unwrap();
        let record = &value["analyses"][0];
        assert_eq!(record["selector"], "compare");
        assert_eq!(record["disk"]["method"], "hough");
        assert_eq!(record["fits"][0]["model"], "quadratic");
        assert_eq!(record["skipped"][0]["model"], "claret");
        assert_eq!(record["best_law"]["model"], "quadratic");
        assert_eq!(record["profile"]["mu"][1], 1.0);
        // Non-finite floats have no JSON representation.
        assert!(record["fits"][0]["standard_errors"][1].is_null());
    }

    #[test]
    fn document_survives_a_file_round_trip() {
        let path = std::env::temp_dir().join(format!("ldark-doc-{}.json", std::process::id()));
        let doc = AnalysisDocument::new(vec![AnalysisRecord::from_output(
            Path::new("sun.png"),
            &sample_output(),
        )]);
        write_document_json(&path, &doc).unwrap();
        let back = read_document_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back.analyses.len(), 1);
        let fit = &back.analyses[0].fits[0];
        assert_eq!(fit.coefficients, vec![0.41, 0.19]);
        assert!(fit.standard_errors[1].is_infinite());
        assert_eq!(back.analyses[0].profile, doc.analyses[0].profile);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_document_json(Path::new("/nonexistent/analysis.json")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
