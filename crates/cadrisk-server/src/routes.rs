//! Router and handlers.
//!
//! - `POST /result/`: form-encoded assessment
//! - `GET  /health` : liveness plus artifact summary
//! - `/static/*`    : static files, including rendered plots

use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use tracing::debug;

use cadrisk_contracts::{assessment::AssessmentReport, patient::RawPatientForm};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/result/", post(assess).fallback(method_not_allowed))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

async fn assess(
    State(state): State<AppState>,
    form: Result<Form<RawPatientForm>, FormRejection>,
) -> Result<Json<AssessmentReport>, ApiError> {
    let Form(form) = form.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    debug!("assessment request received");

    let assessor = Arc::clone(&state.assessor);
    let assessment = tokio::task::spawn_blocking(move || assessor.assess(&form))
        .await
        .map_err(|e| ApiError::Internal(format!("assessment task failed: {e}")))??;

    Ok(Json(assessment.report))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_width": state.assessor.model().input_width(),
        "background_rows": state.background_rows,
    }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
