//! Startup loading of the three frozen artifacts.
//!
//! Each artifact is read once, fingerprinted with SHA-256, and optionally
//! checked against a pinned digest. A pinned digest that does not match is a
//! hard startup error: a scaler or model from a different training run would
//! otherwise produce wrong predictions with no error signal.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::info;

use cadrisk_contracts::{
    attribution::BackgroundSample,
    error::{CadError, CadResult},
    feature::FEATURE_COUNT,
};
use cadrisk_core::scaler::StandardScaler;

use crate::{background::parse_background, model::ModelArtifact};

/// Where an artifact lives and, optionally, what its SHA-256 must be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    pub path: PathBuf,
    /// Lowercase hex digest. Compared case-insensitively.
    pub sha256: Option<String>,
}

impl ArtifactSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), sha256: None }
    }

    pub fn pinned(path: impl Into<PathBuf>, sha256: impl Into<String>) -> Self {
        Self { path: path.into(), sha256: Some(sha256.into()) }
    }
}

/// Everything the assessor needs from disk.
#[derive(Debug)]
pub struct LoadedArtifacts {
    pub model: ModelArtifact,
    pub scaler: StandardScaler,
    pub background: BackgroundSample,
    /// `(path, sha256)` of each artifact in load order: model, scaler, background.
    pub fingerprints: Vec<(PathBuf, String)>,
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Read an artifact and verify its pinned digest, if any.
pub fn read_artifact(source: &ArtifactSource) -> CadResult<(Vec<u8>, String)> {
    let bytes = std::fs::read(&source.path).map_err(|e| {
        CadError::config(format!(
            "failed to read artifact '{}': {}",
            source.path.display(),
            e
        ))
    })?;
    let digest = fingerprint(&bytes);

    if let Some(expected) = &source.sha256 {
        if !expected.eq_ignore_ascii_case(&digest) {
            return Err(CadError::config(format!(
                "artifact '{}' has sha256 {} but {} was pinned",
                source.path.display(),
                digest,
                expected
            )));
        }
    }

    info!(path = %source.path.display(), sha256 = %digest, "artifact loaded");
    Ok((bytes, digest))
}

/// Load the model, scaler, and background sample and check they agree on
/// the feature layout.
pub fn load_artifacts(
    model: &ArtifactSource,
    scaler: &ArtifactSource,
    background: &ArtifactSource,
) -> CadResult<LoadedArtifacts> {
    let (model_bytes, model_digest) = read_artifact(model)?;
    let model_artifact = ModelArtifact::from_json_str(&utf8(&model_bytes, &model.path)?)?;

    let (scaler_bytes, scaler_digest) = read_artifact(scaler)?;
    let fitted = StandardScaler::from_json_str(&utf8(&scaler_bytes, &scaler.path)?)?;

    let (background_bytes, background_digest) = read_artifact(background)?;
    let sample = parse_background(background_bytes.as_slice(), &fitted)?;

    let width = model_artifact.input_width();
    if width != FEATURE_COUNT {
        return Err(CadError::config(format!(
            "model expects {} inputs but the feature layout has {}",
            width, FEATURE_COUNT
        )));
    }

    info!(
        model_kind = model_artifact.kind(),
        background_rows = sample.len(),
        scaler_mean = fitted.mean(),
        scaler_scale = fitted.scale(),
        "artifacts ready"
    );

    Ok(LoadedArtifacts {
        model: model_artifact,
        scaler: fitted,
        background: sample,
        fingerprints: vec![
            (model.path.clone(), model_digest),
            (scaler.path.clone(), scaler_digest),
            (background.path.clone(), background_digest),
        ],
    })
}

fn utf8(bytes: &[u8], path: &Path) -> CadResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        CadError::config(format!("artifact '{}' is not UTF-8: {}", path.display(), e))
    })
}
