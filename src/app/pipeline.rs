//! Shared analysis pipeline used by the CLI.
//!
//! bytes → sha256 → (cache) → preprocess → locate disk → radial profile → fit(s)
//!
//! Everything up to the profile is cached per image content; fits are always
//! recomputed because they depend on the request's model selector.

use std::path::Path;

use crate::cache::{CachedProfile, ProfileCache};
use crate::domain::{AnalysisConfig, Disk, FitResult, ModelKind, ModelSelector, RadialProfile};
use crate::error::AppError;
use crate::fit::{fit_all_models, fit_kind};

/// All computed outputs of one image analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// SHA-256 hex digest of the raw image bytes.
    pub image_hash: String,
    pub selector: ModelSelector,
    pub disk: Disk,
    pub profile: RadialProfile,
    /// One fit for a single-model request; ranked by R² descending in compare mode.
    pub fits: Vec<FitResult>,
    /// Compare mode only: models that failed and why.
    pub skipped: Vec<(ModelKind, String)>,
    pub cache_hit: bool,
}

impl AnalysisOutput {
    pub fn best(&self) -> Option<&FitResult> {
        self.fits.first()
    }
}

/// Read an image from disk and analyze it.
///
/// The extension check happens first so unsupported containers never reach
/// the decoder.
pub fn analyze_path(
    path: &Path,
    selector: ModelSelector,
    cache: &ProfileCache,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AppError> {
    crate::preprocess::check_extension(path)?;
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::io(format!("Failed to read image '{}': {e}", path.display())))?;
    analyze_bytes(&bytes, selector, cache, config)
}

/// Analyze raw image bytes.
///
/// A single-model request either fully succeeds or fails. Compare mode only
/// fails on detection/extraction; individual model failures end up in `skipped`.
pub fn analyze_bytes(
    bytes: &[u8],
    selector: ModelSelector,
    cache: &ProfileCache,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AppError> {
    let image_hash = ProfileCache::key_for(bytes);
    let (entry, cache_hit) = cache.get_or_try_insert_with(&image_hash, || extract_profile(bytes, config))?;

    if cache_hit {
        tracing::info!(hash = %image_hash, "cache hit, reusing extracted profile");
    } else {
        tracing::info!(hash = %image_hash, bins = entry.profile.len(), "profile extracted and cached");
    }

    let mu = entry.profile.mu();
    let intensity = entry.profile.intensity();

    let (fits, skipped) = match selector.single() {
        Some(kind) => (vec![fit_kind(kind, mu, intensity, &config.solver)?], Vec::new()),
        None => {
            let cmp = fit_all_models(mu, intensity, &config.solver);
            if cmp.ranked.is_empty() {
                tracing::warn!("no model could be fitted to the profile");
            }
            (cmp.ranked, cmp.skipped)
        }
    };

    Ok(AnalysisOutput {
        image_hash,
        selector,
        disk: entry.disk,
        profile: entry.profile.clone(),
        fits,
        skipped,
        cache_hit,
    })
}

/// Decode, locate the disk and extract its profile (the cacheable part).
pub fn extract_profile(bytes: &[u8], config: &AnalysisConfig) -> Result<CachedProfile, AppError> {
    let image = crate::preprocess::decode_and_preprocess(bytes, &config.preprocess)?;
    let disk = crate::detect::locate_disk(&image, &config.detector)?;
    let profile = crate::profile::extract_radial_profile(&image, &disk, &config.profile)?;
    Ok(CachedProfile { disk, profile })
}
