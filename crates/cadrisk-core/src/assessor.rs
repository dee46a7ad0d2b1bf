//! The CADRISK assessor: the single-request pipeline runner.
//!
//! Every request walks the same stages:
//!
//!   Received → Validated → Encoded → Scored → Explained → Responded
//!
//! Any error moves the request to `Failed` and is returned to the caller
//! unchanged; no partial report is ever produced. The one exception is the
//! `Explained` stage under `ExplanationFailurePolicy::Degrade`, where an
//! explanation error drops the plot but keeps the prediction.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cadrisk_contracts::{
    assessment::{Assessment, AssessmentId, AssessmentReport, Stage},
    attribution::Attribution,
    error::CadResult,
    feature::Feature,
    patient::RawPatientForm,
};

use crate::{
    encoder::{CategoryPolicy, FeatureEncoder},
    recommend::recommendations,
    scaler::StandardScaler,
    traits::{Classifier, Explainer, PlotRenderer, PlotStore},
};

/// What to do when the attribution stage fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExplanationFailurePolicy {
    /// Fail the whole request.
    #[default]
    Fail,
    /// Return the prediction and recommendations without a plot.
    Degrade,
}

/// Per-deployment pipeline switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssessorSettings {
    pub categories: CategoryPolicy,
    pub on_explanation_failure: ExplanationFailurePolicy,
}

/// Runs assessments against one set of frozen artifacts.
///
/// Construct once at startup and share (e.g. behind an `Arc`). All fields
/// are read-only after construction, so `assess()` can run concurrently.
pub struct Assessor {
    model: Box<dyn Classifier>,
    scaler: StandardScaler,
    explainer: Box<dyn Explainer>,
    renderer: Box<dyn PlotRenderer>,
    store: Box<dyn PlotStore>,
    encoder: FeatureEncoder,
    settings: AssessorSettings,
    feature_names: Vec<String>,
}

impl Assessor {
    /// Create an assessor with default settings.
    pub fn new(
        model: Box<dyn Classifier>,
        scaler: StandardScaler,
        explainer: Box<dyn Explainer>,
        renderer: Box<dyn PlotRenderer>,
        store: Box<dyn PlotStore>,
    ) -> Self {
        Self {
            model,
            scaler,
            explainer,
            renderer,
            store,
            encoder: FeatureEncoder::default(),
            settings: AssessorSettings::default(),
            feature_names: Feature::names(),
        }
    }

    /// Replace the pipeline settings.
    pub fn with_settings(mut self, settings: AssessorSettings) -> Self {
        self.encoder = FeatureEncoder::new(settings.categories);
        self.settings = settings;
        self
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    /// Assess one request under a fresh `AssessmentId`.
    pub fn assess(&self, form: &RawPatientForm) -> CadResult<Assessment> {
        self.assess_with_id(AssessmentId::new(), form)
    }

    /// Assess one request under a caller-chosen id.
    ///
    /// The id becomes the plot's storage key, so callers must not reuse it
    /// across concurrent requests.
    pub fn assess_with_id(&self, id: AssessmentId, form: &RawPatientForm) -> CadResult<Assessment> {
        let mut stage = Stage::Received;
        debug!(assessment_id = %id, stage = %stage, "assessment starting");

        match self.run(id, form, &mut stage) {
            Ok(assessment) => {
                advance(&id, &mut stage, Stage::Responded);
                info!(
                    assessment_id = %id,
                    label = assessment.prediction.label.class(),
                    score = assessment.prediction.score,
                    recommendations = assessment.report.recommendations.len(),
                    explained = assessment.attribution.is_some(),
                    "assessment complete"
                );
                Ok(assessment)
            }
            Err(err) => {
                let failed_after = stage;
                advance(&id, &mut stage, Stage::Failed);
                warn!(
                    assessment_id = %id,
                    failed_after = %failed_after,
                    kind = ?err.kind(),
                    error = %err,
                    "assessment failed"
                );
                Err(err)
            }
        }
    }

    fn run(
        &self,
        id: AssessmentId,
        form: &RawPatientForm,
        stage: &mut Stage,
    ) -> CadResult<Assessment> {
        // ── Validated ────────────────────────────────────────────────────────
        let input = self.encoder.parse(form)?;
        advance(&id, stage, Stage::Validated);

        // ── Encoded ──────────────────────────────────────────────────────────
        //
        // Flags come from the raw encoding; scaling only touches Age.
        let raw = self.encoder.encode(&input)?;
        let risk_factors = raw.risk_factors();
        let features = self.scaler.apply(&raw);
        advance(&id, stage, Stage::Encoded);

        // ── Scored ───────────────────────────────────────────────────────────
        let prediction = self.model.predict(&features)?;
        advance(&id, stage, Stage::Scored);

        // ── Explained ────────────────────────────────────────────────────────
        let (attribution, plot_url) = match self.explain(&id, features.as_slice()) {
            Ok((attribution, url)) => (Some(attribution), Some(url)),
            Err(err) => match self.settings.on_explanation_failure {
                ExplanationFailurePolicy::Fail => return Err(err),
                ExplanationFailurePolicy::Degrade => {
                    warn!(
                        assessment_id = %id,
                        error = %err,
                        "explanation failed, responding without plot"
                    );
                    (None, None)
                }
            },
        };
        advance(&id, stage, Stage::Explained);

        let report = AssessmentReport {
            result: prediction.label.message().to_string(),
            feature_importance_plot_path: plot_url,
            recommendations: recommendations(&risk_factors),
        };

        Ok(Assessment {
            id,
            features,
            risk_factors,
            prediction,
            attribution,
            report,
            completed_at: Utc::now(),
        })
    }

    /// Attribute, render, and store. Returns the attribution and plot URL.
    fn explain(&self, id: &AssessmentId, row: &[f64]) -> CadResult<(Attribution, String)> {
        let attribution = self
            .explainer
            .explain(self.model.as_ref(), row, &self.feature_names)?;
        debug!(
            assessment_id = %id,
            baseline = attribution.baseline,
            output = attribution.output,
            gap = attribution.additive_gap(),
            "attribution computed"
        );

        let png = self.renderer.render(&attribution)?;
        let url = self.store.store(&plot_key(id), &png)?;
        Ok((attribution, url))
    }
}

/// Storage key of the attribution plot for one assessment.
pub fn plot_key(id: &AssessmentId) -> String {
    format!("shap_{}.png", id)
}

fn advance(id: &AssessmentId, stage: &mut Stage, next: Stage) {
    debug_assert!(!stage.is_terminal(), "no transition out of {stage}");
    debug!(assessment_id = %id, from = %stage, to = %next, "stage transition");
    *stage = next;
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use cadrisk_contracts::{
        assessment::{AssessmentId, RiskLabel},
        attribution::{Attribution, FeatureContribution},
        error::{CadError, CadResult},
        patient::RawPatientForm,
    };

    use crate::encoder::CategoryPolicy;
    use crate::recommend::{DIABETES_ADVICE, HYPERTENSION_ADVICE, OBESITY_ADVICE, SMOKING_ADVICE};
    use crate::scaler::StandardScaler;
    use crate::traits::{ensure_width, Classifier, Explainer, PlotRenderer, PlotStore};

    use super::{plot_key, Assessor, AssessorSettings, ExplanationFailurePolicy};

    // ── Mock helpers ─────────────────────────────────────────────────────────

    fn reference_form() -> RawPatientForm {
        RawPatientForm {
            age: Some("55".into()),
            weight: Some("90".into()),
            height: Some("170".into()),
            sex: Some("male".into()),
            diabetic: Some("diabetic".into()),
            sbp: Some("150".into()),
            dbp: Some("95".into()),
            csm: Some("smoker".into()),
        }
    }

    /// A model that returns the mean of its inputs, clamped to [0, 1],
    /// and records the rows it saw.
    struct MockModel {
        seen: Arc<Mutex<Vec<Vec<f64>>>>,
    }

    impl Classifier for MockModel {
        fn input_width(&self) -> usize {
            6
        }

        fn score(&self, row: &[f64]) -> CadResult<f64> {
            ensure_width(row, 6)?;
            self.seen.lock().unwrap().push(row.to_vec());
            Ok((row.iter().sum::<f64>() / 6.0).clamp(0.0, 1.0))
        }
    }

    /// An explainer that either fails or attributes everything to the first feature.
    struct MockExplainer {
        fail: bool,
    }

    impl Explainer for MockExplainer {
        fn explain(
            &self,
            model: &dyn Classifier,
            row: &[f64],
            feature_names: &[String],
        ) -> CadResult<Attribution> {
            if self.fail {
                return Err(CadError::Explanation { reason: "empty background".into() });
            }
            let output = model.score(row)?;
            let contributions = feature_names
                .iter()
                .zip(row)
                .enumerate()
                .map(|(i, (name, value))| FeatureContribution {
                    feature: name.clone(),
                    value: *value,
                    contribution: if i == 0 { output - 0.5 } else { 0.0 },
                })
                .collect();
            Ok(Attribution { contributions, baseline: 0.5, output })
        }
    }

    struct MockRenderer;

    impl PlotRenderer for MockRenderer {
        fn render(&self, _attribution: &Attribution) -> CadResult<Vec<u8>> {
            Ok(vec![0x89, b'P', b'N', b'G'])
        }
    }

    /// A store that records every key it was asked to write.
    struct MockStore {
        keys: Arc<Mutex<Vec<String>>>,
    }

    impl PlotStore for MockStore {
        fn store(&self, key: &str, _bytes: &[u8]) -> CadResult<String> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(format!("/static/assets/img/{key}"))
        }
    }

    struct Harness {
        assessor: Assessor,
        seen: Arc<Mutex<Vec<Vec<f64>>>>,
        keys: Arc<Mutex<Vec<String>>>,
    }

    fn harness(fail_explain: bool, settings: AssessorSettings) -> Harness {
        let seen = Arc::new(Mutex::new(vec![]));
        let keys = Arc::new(Mutex::new(vec![]));
        let assessor = Assessor::new(
            Box::new(MockModel { seen: seen.clone() }),
            StandardScaler::new(55.0, 10.0).unwrap(),
            Box::new(MockExplainer { fail: fail_explain }),
            Box::new(MockRenderer),
            Box::new(MockStore { keys: keys.clone() }),
        )
        .with_settings(settings);
        Harness { assessor, seen, keys }
    }

    // ── Tests ────────────────────────────────────────────────────────────────

    #[test]
    fn full_pipeline_produces_report() {
        let h = harness(false, AssessorSettings::default());
        let id = AssessmentId::new();
        let assessment = h.assessor.assess_with_id(id, &reference_form()).unwrap();

        // Age 55 scaled with mean 55 → 0.0, five active indicators → 5/6.
        assert_eq!(assessment.features.as_slice(), &[0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(assessment.prediction.label, RiskLabel::AtRisk);
        assert_eq!(
            assessment.report.result,
            "The patient is at risk of having coronary artery disease"
        );
        assert_eq!(
            assessment.report.recommendations,
            vec![DIABETES_ADVICE, HYPERTENSION_ADVICE, SMOKING_ADVICE, OBESITY_ADVICE]
        );
        assert_eq!(
            assessment.report.feature_importance_plot_path.as_deref(),
            Some(format!("/static/assets/img/{}", plot_key(&id)).as_str())
        );
        assert!(assessment.attribution.is_some());
    }

    #[test]
    fn model_receives_scaled_age() {
        let h = harness(false, AssessorSettings::default());
        h.assessor.assess(&reference_form()).unwrap();
        let seen = h.seen.lock().unwrap();
        assert_eq!(seen[0][0], 0.0, "age 55 with mean 55 must be scaled to 0");
    }

    #[test]
    fn low_risk_patient_gets_low_risk_message_and_no_advice() {
        let h = harness(false, AssessorSettings::default());
        let form = RawPatientForm {
            sex: Some("female".into()),
            diabetic: Some("non-diabetic".into()),
            sbp: Some("120".into()),
            dbp: Some("80".into()),
            csm: Some("non-smoker".into()),
            weight: Some("60".into()),
            ..reference_form()
        };
        let assessment = h.assessor.assess(&form).unwrap();
        assert_eq!(assessment.prediction.label, RiskLabel::LowRisk);
        assert!(assessment.report.result.contains("low risk"));
        assert!(assessment.report.recommendations.is_empty());
    }

    #[test]
    fn validation_failure_never_reaches_model() {
        let h = harness(false, AssessorSettings::default());
        let form = RawPatientForm { age: None, ..reference_form() };
        let err = h.assessor.assess(&form).unwrap_err();
        assert!(matches!(err, CadError::MissingField { ref field } if field == "age"));
        assert!(h.seen.lock().unwrap().is_empty(), "model must not run on invalid input");
        assert!(h.keys.lock().unwrap().is_empty(), "no plot may be stored");
    }

    #[test]
    fn explanation_failure_fails_request_by_default() {
        let h = harness(true, AssessorSettings::default());
        let err = h.assessor.assess(&reference_form()).unwrap_err();
        assert!(matches!(err, CadError::Explanation { .. }));
        assert!(h.keys.lock().unwrap().is_empty());
    }

    #[test]
    fn explanation_failure_degrades_when_configured() {
        let settings = AssessorSettings {
            on_explanation_failure: ExplanationFailurePolicy::Degrade,
            ..Default::default()
        };
        let h = harness(true, settings);
        let assessment = h.assessor.assess(&reference_form()).unwrap();
        assert!(assessment.attribution.is_none());
        assert!(assessment.report.feature_importance_plot_path.is_none());
        assert_eq!(assessment.report.recommendations.len(), 4);
    }

    #[test]
    fn strict_categories_reject_unknown_values() {
        let settings = AssessorSettings {
            categories: CategoryPolicy::Strict,
            ..Default::default()
        };
        let h = harness(false, settings);
        let form = RawPatientForm { sex: Some("unknown".into()), ..reference_form() };
        assert!(matches!(
            h.assessor.assess(&form).unwrap_err(),
            CadError::InvalidField { .. }
        ));
    }

    #[test]
    fn each_request_stores_under_its_own_key() {
        let h = harness(false, AssessorSettings::default());
        for _ in 0..5 {
            h.assessor.assess(&reference_form()).unwrap();
        }
        let keys = h.keys.lock().unwrap();
        let unique: std::collections::HashSet<&String> = keys.iter().collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(unique.len(), 5, "plot keys must be request-unique");
        assert!(keys.iter().all(|k| k.starts_with("shap_") && k.ends_with(".png")));
    }

    #[test]
    fn assessor_is_shareable_across_threads() {
        let h = harness(false, AssessorSettings::default());
        let assessor = Arc::new(h.assessor);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let a = Arc::clone(&assessor);
                std::thread::spawn(move || a.assess(&reference_form()).map(|r| r.report))
            })
            .collect();
        let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
        assert!(reports.windows(2).all(|w| w[0].result == w[1].result));
    }
}
