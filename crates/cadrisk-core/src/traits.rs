//! Trait seams of the assessment pipeline.
//!
//! - `Classifier`  : the frozen model (scores a fixed-width numeric row)
//! - `Explainer`   : local attribution for one row against a background
//! - `PlotRenderer`: turns an attribution into image bytes
//! - `PlotStore`   : persists image bytes under a caller-chosen key
//!
//! The `Assessor` owns one of each and is the only place they are wired
//! together. Every implementation must be safe to call concurrently: the
//! same instances serve all requests.

use cadrisk_contracts::{
    assessment::{Prediction, RiskLabel},
    attribution::Attribution,
    error::{CadError, CadResult},
    feature::FeatureVector,
};

/// A frozen binary classifier.
///
/// Input conversion happens before this trait is reached: implementations
/// receive a plain numeric row in model column order and never inspect
/// where it came from.
pub trait Classifier: Send + Sync {
    /// Number of inputs the model was built with.
    fn input_width(&self) -> usize;

    /// Probability of class 1 for a single row.
    ///
    /// Implementations must reject rows whose length differs from
    /// `input_width()` with `CadError::Model`.
    fn score(&self, row: &[f64]) -> CadResult<f64>;

    /// Decision threshold on `score`. Scores at or above it are class 1.
    fn threshold(&self) -> f64 {
        0.5
    }

    /// Map a score to its risk class.
    fn classify(&self, score: f64) -> RiskLabel {
        if score >= self.threshold() {
            RiskLabel::AtRisk
        } else {
            RiskLabel::LowRisk
        }
    }

    /// Hard 0/1 output for a single row.
    fn label(&self, row: &[f64]) -> CadResult<RiskLabel> {
        Ok(self.classify(self.score(row)?))
    }

    /// Score an encoded feature vector: one deterministic forward pass.
    fn predict(&self, features: &FeatureVector) -> CadResult<Prediction> {
        let score = self.score(features.as_slice())?;
        Ok(Prediction {
            label: self.classify(score),
            score,
        })
    }
}

/// Check a row against the model's expected width.
pub fn ensure_width(row: &[f64], expected: usize) -> CadResult<()> {
    if row.len() != expected {
        return Err(CadError::Model {
            reason: format!(
                "input has {} features but the model expects {}",
                row.len(),
                expected
            ),
        });
    }
    Ok(())
}

/// Computes per-feature contributions for a single prediction.
pub trait Explainer: Send + Sync {
    /// Explain `model`'s output for `row`.
    ///
    /// `feature_names` has one entry per column of `row` and labels the
    /// returned contributions.
    fn explain(
        &self,
        model: &dyn Classifier,
        row: &[f64],
        feature_names: &[String],
    ) -> CadResult<Attribution>;
}

/// Rasterizes an attribution into an encoded image.
pub trait PlotRenderer: Send + Sync {
    /// Return the encoded image bytes (PNG).
    fn render(&self, attribution: &Attribution) -> CadResult<Vec<u8>>;
}

/// Stores rendered plots and hands back the URL they are served under.
pub trait PlotStore: Send + Sync {
    /// Persist `bytes` under `key` and return the public URL path.
    ///
    /// Keys are unique per request; implementations may overwrite on a
    /// repeated key.
    fn store(&self, key: &str, bytes: &[u8]) -> CadResult<String>;
}
