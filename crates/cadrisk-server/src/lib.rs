//! # cadrisk-server
//!
//! The HTTP face of the CADRISK pipeline (axum).
//!
//! ```rust,ignore
//! let config = ServiceConfig::from_file(Path::new("assets/cadrisk.toml"))?;
//! cadrisk_server::serve(config).await?;
//! ```
//!
//! Each assessment runs on the blocking thread pool; the async runtime only
//! parses forms and writes responses.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ServerError};
pub use routes::router;
pub use server::serve;
pub use state::{build_assessor, AppState};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use cadrisk_config::ServiceConfig;
    use cadrisk_store::InMemoryPlotStore;

    use super::*;

    const AT_RISK_FORM: &str =
        "age=68&weight=96&height=170&sex=Male&diabetic=Diabetic&sbp=150&dbp=95&csm=Smoker";

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn reference_app() -> Router {
        let assessor =
            cadrisk_ref::build_reference_assessor(Box::new(InMemoryPlotStore::default())).unwrap();
        router(AppState::new(assessor, 100), Path::new("static"))
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/result/")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assets_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets")
    }

    // ── POST /result/ ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn assessment_returns_report() {
        let response = reference_app().oneshot(post_form(AT_RISK_FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let obj = body.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(
            body["result"],
            "The patient is at risk of having coronary artery disease"
        );
        let path = body["feature_importance_plot_path"].as_str().unwrap();
        assert!(path.starts_with("/static/assets/img/shap_"), "{path}");
        assert!(path.ends_with(".png"));

        let recs = body["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[2], "Facilitate tobacco cessation to the patient");
    }

    #[tokio::test]
    async fn low_risk_patient_gets_no_recommendations() {
        let form = "age=30&weight=58&height=165&sex=female&diabetic=no&sbp=115&dbp=75&csm=no";
        let response = reference_app().oneshot(post_form(form)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(
            body["result"],
            "The patient is having a low risk of developing coronary artery disease"
        );
        assert_eq!(body["recommendations"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_field_is_a_400_with_only_an_error_key() {
        let form = "weight=96&height=170&sex=Male&diabetic=Diabetic&sbp=150&dbp=95&csm=Smoker";
        let response = reference_app().oneshot(post_form(form)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body.as_object().unwrap().len(), 1);
        let msg = body["error"].as_str().unwrap();
        assert!(msg.starts_with("Error processing form data: "), "{msg}");
        assert!(msg.contains("age"), "{msg}");
    }

    #[tokio::test]
    async fn non_numeric_and_zero_height_are_rejected() {
        for form in [
            "age=abc&weight=96&height=170&sex=Male&diabetic=Diabetic&sbp=150&dbp=95&csm=Smoker",
            "age=68&weight=96&height=0&sex=Male&diabetic=Diabetic&sbp=150&dbp=95&csm=Smoker",
        ] {
            let response = reference_app().oneshot(post_form(form)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{form}");
            assert!(json_body(response).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn non_form_body_is_a_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/result/")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"age": 68}"#))
            .unwrap();
        let response = reference_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let msg = json_body(response).await["error"].as_str().unwrap().to_string();
        assert!(msg.starts_with("Error processing form data: "));
    }

    #[tokio::test]
    async fn other_methods_are_405() {
        for method in ["GET", "PUT", "DELETE"] {
            let request = Request::builder()
                .method(method)
                .uri("/result/")
                .body(Body::empty())
                .unwrap();
            let response = reference_app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_eq!(
                json_body(response).await,
                serde_json::json!({"error": "Method not allowed"})
            );
        }
    }

    // ── GET /health ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn health_reports_artifact_summary() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = reference_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"status": "ok", "model_width": 6, "background_rows": 100})
        );
    }

    // ── End to end ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn configured_app_serves_the_plot_it_returns() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets_dir();
        let toml = format!(
            "[server]\nstatic_dir = \"static\"\n\n[artifacts]\nmodel = {:?}\nscaler = {:?}\nbackground = {:?}\n\n[attribution]\nbackground_size = 40\n",
            assets.join("model.json").display().to_string(),
            assets.join("scaler.json").display().to_string(),
            assets.join("CAD.csv").display().to_string(),
        );
        let config_path = dir.path().join("cadrisk.toml");
        std::fs::write(&config_path, toml).unwrap();

        let config = ServiceConfig::from_file(&config_path).unwrap();
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.background_rows, 40);
        let app = router(state, &config.server.static_dir);

        let response = app.clone().oneshot(post_form(AT_RISK_FORM)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let path = json_body(response).await["feature_importance_plot_path"]
            .as_str()
            .unwrap()
            .to_string();

        let request = Request::builder().uri(&path).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn configured_app_keeps_a_bounded_number_of_plots() {
        let dir = tempfile::tempdir().unwrap();
        let assets = assets_dir();
        let toml = format!(
            "[server]\nstatic_dir = \"static\"\nmax_plots = 2\n\n[artifacts]\nmodel = {:?}\nscaler = {:?}\nbackground = {:?}\n\n[attribution]\nbackground_size = 20\n",
            assets.join("model.json").display().to_string(),
            assets.join("scaler.json").display().to_string(),
            assets.join("CAD.csv").display().to_string(),
        );
        let config_path = dir.path().join("cadrisk.toml");
        std::fs::write(&config_path, toml).unwrap();

        let config = ServiceConfig::from_file(&config_path).unwrap();
        let app = router(AppState::from_config(&config).unwrap(), &config.server.static_dir);

        let mut paths = Vec::new();
        for _ in 0..3 {
            let response = app.clone().oneshot(post_form(AT_RISK_FORM)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            paths.push(body["feature_importance_plot_path"].as_str().unwrap().to_string());
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let on_disk = std::fs::read_dir(config.plot_dir()).unwrap().count();
        assert_eq!(on_disk, 2);
        assert_eq!(std::fs::read_dir(&config.server.plot_staging_dir).unwrap().count(), 0);

        let newest = Request::builder().uri(&paths[2]).body(Body::empty()).unwrap();
        assert_eq!(app.clone().oneshot(newest).await.unwrap().status(), StatusCode::OK);
        let oldest = Request::builder().uri(&paths[0]).body(Body::empty()).unwrap();
        assert_eq!(app.oneshot(oldest).await.unwrap().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_artifact_path_fails_startup() {
        let mut config = ServiceConfig::default();
        config.artifacts.model = PathBuf::from("/nonexistent/model.json");
        let err = build_assessor(&config, Box::new(InMemoryPlotStore::default())).err().unwrap();
        assert!(err.to_string().contains("/nonexistent/model.json"));
    }
}
