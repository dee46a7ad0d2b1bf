//! # cadrisk-contracts
//!
//! Shared types, feature layout, and error contracts for the CADRISK
//! coronary-artery-disease risk pipeline.
//!
//! All crates in the workspace import from here. No pipeline logic lives in
//! this crate, only data definitions and error types.

pub mod assessment;
pub mod attribution;
pub mod error;
pub mod feature;
pub mod patient;

#[cfg(test)]
mod tests {
    use super::*;
    use assessment::{AssessmentId, AssessmentReport, RiskLabel, Stage};
    use attribution::{Attribution, BackgroundSample, FeatureContribution};
    use error::{CadError, ErrorKind};
    use feature::{Feature, FeatureVector, RiskFactorFlags, FEATURE_COUNT};
    use patient::PatientInput;

    // ── Feature layout ───────────────────────────────────────────────────────

    #[test]
    fn feature_order_matches_model_columns() {
        let names: Vec<&str> = Feature::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "Age",
                "Sex",
                "DiabetesMellitus",
                "Hypertension",
                "CurrentSmoker",
                "Obesity"
            ]
        );
        for (idx, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), idx);
        }
        assert_eq!(Feature::ALL.len(), FEATURE_COUNT);
    }

    #[test]
    fn feature_from_name_ignores_case_and_spaces() {
        assert_eq!(Feature::from_name("Current Smoker"), Some(Feature::CurrentSmoker));
        assert_eq!(Feature::from_name("currentsmoker"), Some(Feature::CurrentSmoker));
        assert_eq!(Feature::from_name(" AGE "), Some(Feature::Age));
        assert_eq!(Feature::from_name("Diabetes_Mellitus"), Some(Feature::DiabetesMellitus));
        assert_eq!(Feature::from_name("BMI"), None);
    }

    #[test]
    fn risk_factors_follow_indicators() {
        let v = FeatureVector::new([0.3, 1.0, 1.0, 0.0, 1.0, 0.0]);
        let flags = v.risk_factors();
        assert!(flags.diabetes);
        assert!(!flags.hypertension);
        assert!(flags.smoking);
        assert!(!flags.obesity);

        let none = FeatureVector::new([0.3, 1.0, 0.0, 0.0, 0.0, 0.0]).risk_factors();
        assert_eq!(none, RiskFactorFlags::default(), "sex and age are not modifiable risk factors");
    }

    // ── Patient ──────────────────────────────────────────────────────────────

    #[test]
    fn bmi_uses_height_in_metres() {
        let p = PatientInput {
            age: 40,
            weight: 81,
            height: 180,
            sex: "female".into(),
            diabetic: "non-diabetic".into(),
            systolic_bp: 120,
            diastolic_bp: 80,
            smoking_status: "non-smoker".into(),
        };
        assert!((p.bmi() - 25.0).abs() < 1e-9);
    }

    // ── Assessment ───────────────────────────────────────────────────────────

    #[test]
    fn risk_label_messages() {
        assert_eq!(
            RiskLabel::from_class(1).message(),
            "The patient is at risk of having coronary artery disease"
        );
        assert_eq!(
            RiskLabel::from_class(0).message(),
            "The patient is having a low risk of developing coronary artery disease"
        );
        assert_eq!(RiskLabel::from_class(7), RiskLabel::LowRisk);
    }

    #[test]
    fn only_responded_and_failed_are_terminal() {
        for stage in [
            Stage::Received,
            Stage::Validated,
            Stage::Encoded,
            Stage::Scored,
            Stage::Explained,
        ] {
            assert!(!stage.is_terminal(), "{stage} must not be terminal");
        }
        assert!(Stage::Responded.is_terminal());
        assert!(Stage::Failed.is_terminal());
    }

    #[test]
    fn assessment_id_new_produces_unique_values() {
        let unique: std::collections::HashSet<String> =
            (0..100).map(|_| AssessmentId::new().to_string()).collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn report_serializes_with_wire_field_names() {
        let report = AssessmentReport {
            result: "r".into(),
            feature_importance_plot_path: Some("/static/assets/img/x.png".into()),
            recommendations: vec!["a".into()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["result"], "r");
        assert_eq!(json["feature_importance_plot_path"], "/static/assets/img/x.png");
        assert_eq!(json["recommendations"][0], "a");

        let degraded = AssessmentReport {
            feature_importance_plot_path: None,
            ..report
        };
        let json = serde_json::to_value(&degraded).unwrap();
        assert!(json["feature_importance_plot_path"].is_null());
    }

    // ── Attribution ──────────────────────────────────────────────────────────

    #[test]
    fn attribution_gap_and_lookup() {
        let attribution = Attribution {
            contributions: vec![
                FeatureContribution { feature: "Age".into(), value: 0.5, contribution: 0.2 },
                FeatureContribution { feature: "Sex".into(), value: 1.0, contribution: -0.05 },
            ],
            baseline: 0.4,
            output: 0.55,
        };
        assert!((attribution.total() - 0.15).abs() < 1e-12);
        assert!(attribution.additive_gap() < 1e-12);
        assert_eq!(attribution.get("Sex"), Some(-0.05));
        assert_eq!(attribution.get("Obesity"), None);
    }

    #[test]
    fn background_rejects_ragged_rows() {
        let err = BackgroundSample::new(2, vec![vec![0.0, 1.0], vec![1.0]]).unwrap_err();
        assert!(err.to_string().contains("background row 1"));

        let ok = BackgroundSample::new(2, vec![vec![0.0, 1.0]]).unwrap();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok.width(), 2);
    }

    // ── CadError ─────────────────────────────────────────────────────────────

    #[test]
    fn error_missing_field_display() {
        let err = CadError::MissingField { field: "age".to_string() };
        assert_eq!(err.to_string(), "missing required field 'age'");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn error_invalid_field_display() {
        let err = CadError::invalid("height", "must be greater than zero");
        let msg = err.to_string();
        assert!(msg.contains("height"));
        assert!(msg.contains("must be greater than zero"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn error_kinds_group_computation_failures() {
        let errs = [
            CadError::Model { reason: "width".into() },
            CadError::Explanation { reason: "empty".into() },
            CadError::ExplanationTimeout { elapsed_ms: 12, limit_ms: 10 },
            CadError::Render { reason: "encode".into() },
            CadError::Storage { reason: "disk full".into() },
        ];
        for err in &errs {
            assert_eq!(err.kind(), ErrorKind::Computation, "{err}");
        }
        assert_eq!(CadError::config("x").kind(), ErrorKind::Configuration);
    }

    #[test]
    fn error_timeout_display() {
        let err = CadError::ExplanationTimeout { elapsed_ms: 1500, limit_ms: 1000 };
        let msg = err.to_string();
        assert!(msg.contains("1500"));
        assert!(msg.contains("1000"));
    }
}
