//! Canned patients for the reference run.
//!
//! Each patient exercises a distinct path through the pipeline: every risk
//! factor active, none active, and single factors on either side of the
//! decision threshold. All patients are fictional.

use serde::Serialize;
use tracing::info;

use cadrisk_contracts::{
    assessment::{Assessment, RiskLabel},
    error::CadResult,
    patient::{PatientInput, RawPatientForm},
};
use cadrisk_core::Assessor;

/// A named patient with the label the reference model assigns.
#[derive(Debug, Clone, Serialize)]
pub struct ReferencePatient {
    pub name: &'static str,
    pub description: &'static str,
    pub input: PatientInput,
    pub expected: RiskLabel,
    /// Recommendation count implied by the patient's risk factors.
    pub expected_recommendations: usize,
}

impl ReferencePatient {
    pub fn form(&self) -> RawPatientForm {
        RawPatientForm::from(&self.input)
    }
}

#[allow(clippy::too_many_arguments)]
fn patient(
    age: u32,
    weight: u32,
    height: u32,
    sex: &str,
    diabetic: &str,
    sbp: i32,
    dbp: i32,
    smoking: &str,
) -> PatientInput {
    PatientInput {
        age,
        weight,
        height,
        sex: sex.to_string(),
        diabetic: diabetic.to_string(),
        systolic_bp: sbp,
        diastolic_bp: dbp,
        smoking_status: smoking.to_string(),
    }
}

/// The reference patients in run order.
pub fn reference_patients() -> Vec<ReferencePatient> {
    vec![
        ReferencePatient {
            name: "all-risk-factors",
            description: "68-year-old diabetic, hypertensive, obese male smoker",
            input: patient(68, 96, 170, "Male", "Diabetic", 150, 95, "Smoker"),
            expected: RiskLabel::AtRisk,
            expected_recommendations: 4,
        },
        ReferencePatient {
            name: "no-risk-factors",
            description: "30-year-old non-smoking woman with normal blood pressure and BMI",
            input: patient(30, 58, 165, "female", "non-diabetic", 115, 75, "non-smoker"),
            expected: RiskLabel::LowRisk,
            expected_recommendations: 0,
        },
        ReferencePatient {
            name: "diabetic-at-sixty",
            description: "60-year-old diabetic man, otherwise without risk factors",
            input: patient(60, 78, 175, "male", "diabetic", 128, 82, "non-smoker"),
            expected: RiskLabel::AtRisk,
            expected_recommendations: 1,
        },
        ReferencePatient {
            name: "hypertensive-at-45",
            description: "45-year-old hypertensive woman, low overall risk",
            input: patient(45, 64, 160, "female", "non-diabetic", 145, 92, "non-smoker"),
            expected: RiskLabel::LowRisk,
            expected_recommendations: 1,
        },
    ]
}

/// Result of running one reference patient.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub patient: ReferencePatient,
    pub assessment: Assessment,
}

impl ScenarioOutcome {
    /// Whether the assessment matches what the patient expects.
    pub fn matches_expectation(&self) -> bool {
        self.assessment.prediction.label == self.patient.expected
            && self.assessment.report.recommendations.len() == self.patient.expected_recommendations
    }
}

/// Assess every reference patient in order, stopping at the first error.
pub fn run_all(assessor: &Assessor) -> CadResult<Vec<ScenarioOutcome>> {
    reference_patients()
        .into_iter()
        .map(|patient| {
            let assessment = assessor.assess(&patient.form())?;
            info!(
                scenario = patient.name,
                result = %assessment.prediction.label,
                score = assessment.prediction.score,
                "reference patient assessed"
            );
            Ok(ScenarioOutcome { patient, assessment })
        })
        .collect()
}
