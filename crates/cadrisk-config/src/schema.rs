//! Configuration schema.
//!
//! Every table and every field is optional; an empty document yields a
//! working local configuration that reads artifacts from `assets/`.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8000"
//! static_dir = "static"
//! plot_url_prefix = "/static/assets/img"
//! plot_staging_dir = "plot-staging"   # outside static_dir
//! max_plots = 200
//!
//! [artifacts]
//! model = "assets/model.json"
//! scaler = "assets/scaler.json"
//! background = "assets/CAD.csv"
//! # scaler_sha256 = "…"
//!
//! [attribution]
//! background_size = 100
//! max_coalitions = 2048
//! seed = 0
//! timeout_ms = 5000
//! explain_output = "probability"   # or "label"
//!
//! [validation]
//! categories = "lenient"           # or "strict"
//!
//! [pipeline]
//! on_explanation_failure = "fail"  # or "degrade"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cadrisk_core::{encoder::CategoryPolicy, ExplanationFailurePolicy};
use cadrisk_explain::ExplainedOutput;

/// Root of the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub artifacts: ArtifactsSection,
    pub attribution: AttributionSection,
    pub validation: ValidationSection,
    pub pipeline: PipelineSection,
}

/// `[server]`: where to listen and where plots are served from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub bind: String,
    /// Directory mounted at `/static`. Plots go to `<static_dir>/assets/img`.
    pub static_dir: PathBuf,
    /// Public URL prefix of the plot directory.
    pub plot_url_prefix: String,
    /// Where plots are written before being moved into place. Must not be
    /// inside `static_dir`, and must share its filesystem.
    pub plot_staging_dir: PathBuf,
    /// Oldest plots beyond this count are deleted.
    pub max_plots: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            static_dir: PathBuf::from("static"),
            plot_url_prefix: "/static/assets/img".to_string(),
            plot_staging_dir: PathBuf::from("plot-staging"),
            max_plots: 200,
        }
    }
}

/// `[artifacts]`: the frozen model, scaler, and background sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactsSection {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub background: PathBuf,
    pub model_sha256: Option<String>,
    pub scaler_sha256: Option<String>,
    pub background_sha256: Option<String>,
}

impl Default for ArtifactsSection {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/model.json"),
            scaler: PathBuf::from("assets/scaler.json"),
            background: PathBuf::from("assets/CAD.csv"),
            model_sha256: None,
            scaler_sha256: None,
            background_sha256: None,
        }
    }
}

/// `[attribution]`: Kernel SHAP knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributionSection {
    pub background_size: usize,
    pub max_coalitions: usize,
    pub seed: u64,
    /// No deadline when absent.
    pub timeout_ms: Option<u64>,
    pub explain_output: ExplainedOutput,
}

impl Default for AttributionSection {
    fn default() -> Self {
        Self {
            background_size: 100,
            max_coalitions: 2048,
            seed: 0,
            timeout_ms: None,
            explain_output: ExplainedOutput::Probability,
        }
    }
}

/// `[validation]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSection {
    pub categories: CategoryPolicy,
}

/// `[pipeline]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    pub on_explanation_failure: ExplanationFailurePolicy,
}
