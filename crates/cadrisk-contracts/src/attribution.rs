//! Attribution and background-sample types.
//!
//! An `Attribution` decomposes one model output into a baseline plus one
//! signed contribution per feature. The decomposition is additive:
//! `baseline + Σ contributions == output` up to floating point error.

use serde::{Deserialize, Serialize};

use crate::error::{CadError, CadResult};

/// Signed contribution of one feature to one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    /// Raw (encoded, scaled) input value of the feature.
    pub value: f64,
    /// Positive values push toward class 1.
    pub contribution: f64,
}

/// Per-feature attribution for a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Contributions in feature column order.
    pub contributions: Vec<FeatureContribution>,
    /// Expected model output over the background sample.
    pub baseline: f64,
    /// The model output being explained.
    pub output: f64,
}

impl Attribution {
    /// Contribution of the named feature, if present.
    pub fn get(&self, feature: &str) -> Option<f64> {
        self.contributions
            .iter()
            .find(|c| c.feature == feature)
            .map(|c| c.contribution)
    }

    /// Sum of all contributions.
    pub fn total(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }

    /// `|baseline + Σ contributions − output|`.
    pub fn additive_gap(&self) -> f64 {
        (self.baseline + self.total() - self.output).abs()
    }
}

/// Reference rows drawn from the training data, in model feature order.
///
/// Immutable once built; shared read-only across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSample {
    width: usize,
    rows: Vec<Vec<f64>>,
}

impl BackgroundSample {
    /// Build a sample, rejecting ragged rows.
    ///
    /// An empty sample is allowed here; explainers reject it when they are
    /// constructed.
    pub fn new(width: usize, rows: Vec<Vec<f64>>) -> CadResult<Self> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(CadError::config(format!(
                "background row {} has {} values, expected {}",
                idx,
                row.len(),
                width
            )));
        }
        Ok(Self { width, rows })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
