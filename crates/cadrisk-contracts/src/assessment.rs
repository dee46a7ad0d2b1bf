//! Per-request assessment types.
//!
//! `Assessment` is what the orchestrator returns to its caller. The HTTP layer
//! serializes only its `report`; the rest is kept for logging and the CLI.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribution::Attribution;
use crate::feature::{FeatureVector, RiskFactorFlags};

/// Unique identifier for one assessment request.
///
/// Used as the storage key of the rendered plot so concurrent requests never
/// write to the same artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub uuid::Uuid);

impl AssessmentId {
    /// Create a new, unique assessment ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AssessmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a single request through the pipeline.
///
/// `Failed` is reachable from every non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Validated,
    Encoded,
    Scored,
    Explained,
    Responded,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Encoded => "encoded",
            Stage::Scored => "scored",
            Stage::Explained => "explained",
            Stage::Responded => "responded",
            Stage::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Responded | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary risk class produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Class 0.
    LowRisk,
    /// Class 1.
    AtRisk,
}

impl RiskLabel {
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            RiskLabel::AtRisk
        } else {
            RiskLabel::LowRisk
        }
    }

    pub fn class(self) -> u8 {
        match self {
            RiskLabel::LowRisk => 0,
            RiskLabel::AtRisk => 1,
        }
    }

    /// The patient-facing risk message.
    pub fn message(self) -> &'static str {
        match self {
            RiskLabel::AtRisk => "The patient is at risk of having coronary artery disease",
            RiskLabel::LowRisk => {
                "The patient is having a low risk of developing coronary artery disease"
            }
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::LowRisk => write!(f, "low-risk"),
            RiskLabel::AtRisk => write!(f, "at-risk"),
        }
    }
}

/// A single classifier decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: RiskLabel,
    /// Probability of class 1 as reported by the model.
    pub score: f64,
}

/// The JSON body returned on success.
///
/// Field names are part of the public HTTP contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub result: String,
    /// URL of the rendered attribution chart; `null` only when the pipeline
    /// is configured to degrade on explanation failure and the explanation
    /// failed.
    pub feature_importance_plot_path: Option<String>,
    pub recommendations: Vec<String>,
}

/// Everything the orchestrator produced for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub features: FeatureVector,
    pub risk_factors: RiskFactorFlags,
    pub prediction: Prediction,
    /// Absent when the explanation failed under the degrade policy.
    pub attribution: Option<Attribution>,
    pub report: AssessmentReport,
    pub completed_at: DateTime<Utc>,
}
