//! Shared application state and its construction from configuration.

use std::sync::Arc;

use tracing::info;

use cadrisk_config::ServiceConfig;
use cadrisk_contracts::error::CadResult;
use cadrisk_core::{traits::PlotStore, Assessor};
use cadrisk_explain::{BarChartRenderer, KernelExplainer};
use cadrisk_model::load_artifacts;
use cadrisk_store::FsPlotStore;

/// Everything a handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub assessor: Arc<Assessor>,
    pub background_rows: usize,
}

impl AppState {
    pub fn new(assessor: Assessor, background_rows: usize) -> Self {
        Self {
            assessor: Arc::new(assessor),
            background_rows,
        }
    }

    /// Load the configured artifacts and wire an assessor that writes plots
    /// under the served static directory.
    pub fn from_config(config: &ServiceConfig) -> CadResult<Self> {
        let store = FsPlotStore::new(
            config.plot_dir(),
            &config.server.plot_staging_dir,
            config.server.plot_url_prefix.clone(),
        )?
        .with_max_plots(config.server.max_plots);
        info!(
            plot_dir = %store.dir().display(),
            max_plots = store.max_plots(),
            "plot store ready"
        );
        let (assessor, background_rows) = build_assessor(config, Box::new(store))?;
        Ok(Self::new(assessor, background_rows))
    }
}

/// Load artifacts named by `config` and build an assessor around `store`.
///
/// Returns the assessor and the number of background rows the explainer
/// kept.
pub fn build_assessor(
    config: &ServiceConfig,
    store: Box<dyn PlotStore>,
) -> CadResult<(Assessor, usize)> {
    let artifacts = load_artifacts(
        &config.model_source(),
        &config.scaler_source(),
        &config.background_source(),
    )?;
    let explainer = KernelExplainer::new(&artifacts.background, config.kernel_config())?;
    let background_rows = explainer.background().len();

    let assessor = Assessor::new(
        artifacts.model.into_classifier(),
        artifacts.scaler,
        Box::new(explainer),
        Box::new(BarChartRenderer::default()),
        store,
    )
    .with_settings(config.assessor_settings());

    info!(
        background_rows,
        categories = ?config.validation.categories,
        on_explanation_failure = ?config.pipeline.on_explanation_failure,
        "assessor ready"
    );
    Ok((assessor, background_rows))
}
