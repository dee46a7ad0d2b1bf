//! Embedded reference artifacts.
//!
//! The model, scaler, and background sample under `assets/` are compiled
//! into this crate so the demo command and tests run without any files on
//! disk. All three are fictional: the background rows are synthetic and the
//! MLP weights were chosen by hand to behave plausibly, not fitted.

use cadrisk_contracts::error::CadResult;
use cadrisk_core::{
    scaler::StandardScaler,
    traits::PlotStore,
    Assessor, AssessorSettings,
};
use cadrisk_explain::{BarChartRenderer, KernelConfig, KernelExplainer};
use cadrisk_model::{
    artifacts::fingerprint, background::parse_background, LoadedArtifacts, ModelArtifact,
};

/// Two-layer MLP (4 ReLU units, logistic output).
pub const REFERENCE_MODEL: &str = include_str!("../../../assets/model.json");

/// Age scaler fitted on the reference background.
pub const REFERENCE_SCALER: &str = include_str!("../../../assets/scaler.json");

/// 160 synthetic rows in the training file layout.
pub const REFERENCE_BACKGROUND: &str = include_str!("../../../assets/CAD.csv");

/// Parse the embedded artifacts.
pub fn reference_artifacts() -> CadResult<LoadedArtifacts> {
    let model = ModelArtifact::from_json_str(REFERENCE_MODEL)?;
    let scaler = StandardScaler::from_json_str(REFERENCE_SCALER)?;
    let background = parse_background(REFERENCE_BACKGROUND.as_bytes(), &scaler)?;
    Ok(LoadedArtifacts {
        model,
        scaler,
        background,
        fingerprints: vec![
            ("assets/model.json".into(), fingerprint(REFERENCE_MODEL.as_bytes())),
            ("assets/scaler.json".into(), fingerprint(REFERENCE_SCALER.as_bytes())),
            ("assets/CAD.csv".into(), fingerprint(REFERENCE_BACKGROUND.as_bytes())),
        ],
    })
}

/// Wire an assessor from loaded artifacts with the default chart renderer.
pub fn assemble(
    artifacts: LoadedArtifacts,
    kernel: KernelConfig,
    settings: AssessorSettings,
    store: Box<dyn PlotStore>,
) -> CadResult<Assessor> {
    let explainer = KernelExplainer::new(&artifacts.background, kernel)?;
    Ok(Assessor::new(
        artifacts.model.into_classifier(),
        artifacts.scaler,
        Box::new(explainer),
        Box::new(BarChartRenderer::default()),
        store,
    )
    .with_settings(settings))
}

/// An assessor over the embedded artifacts with default settings.
pub fn build_reference_assessor(store: Box<dyn PlotStore>) -> CadResult<Assessor> {
    assemble(
        reference_artifacts()?,
        KernelConfig::default(),
        AssessorSettings::default(),
        store,
    )
}
