//! The fitted standard scaler applied to Age.
//!
//! The parameters come from the training run and are loaded once; nothing is
//! fitted at request time. A scaler from a different training run produces
//! wrong predictions without any error, so the artifact loader can pin its
//! SHA-256 (see `cadrisk-model::artifacts`).

use serde::{Deserialize, Serialize};

use cadrisk_contracts::{
    error::{CadError, CadResult},
    feature::{Feature, FeatureVector},
};

/// `z = (x - mean) / scale`, fitted on the training set's Age column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: f64,
    scale: f64,
}

impl StandardScaler {
    /// Build a scaler, rejecting parameters that cannot come from a fit.
    pub fn new(mean: f64, scale: f64) -> CadResult<Self> {
        if !mean.is_finite() {
            return Err(CadError::config(format!("scaler mean must be finite, got {mean}")));
        }
        if !scale.is_finite() || scale == 0.0 {
            return Err(CadError::config(format!(
                "scaler scale must be finite and non-zero, got {scale}"
            )));
        }
        Ok(Self { mean, scale })
    }

    /// Parse a scaler artifact: `{"mean": 54.2, "scale": 10.3}`.
    pub fn from_json_str(s: &str) -> CadResult<Self> {
        let raw: StandardScaler = serde_json::from_str(s)
            .map_err(|e| CadError::config(format!("failed to parse scaler artifact: {}", e)))?;
        Self::new(raw.mean, raw.scale)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn transform(&self, x: f64) -> f64 {
        (x - self.mean) / self.scale
    }

    /// Return `features` with Age replaced by its scaled value.
    pub fn apply(&self, features: &FeatureVector) -> FeatureVector {
        let mut scaled = *features;
        scaled.set(Feature::Age, self.transform(features.get(Feature::Age)));
        scaled
    }
}
