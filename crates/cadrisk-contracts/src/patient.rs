//! Patient input types.
//!
//! `RawPatientForm` is what arrives on the wire: every field is optional text.
//! `PatientInput` is the parsed, typed record the encoder consumes. The
//! conversion between the two lives in `cadrisk-core::encoder` so that it
//! happens exactly once, at the boundary.

use serde::{Deserialize, Serialize};

/// Form fields as posted by the assessment page.
///
/// Field names match the HTML form (`sbp`, `dbp`, `csm`), not the internal
/// names, so this type can be deserialized directly from a urlencoded body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPatientForm {
    pub age: Option<String>,
    pub weight: Option<String>,
    pub height: Option<String>,
    pub sex: Option<String>,
    pub diabetic: Option<String>,
    /// Systolic blood pressure, mmHg.
    pub sbp: Option<String>,
    /// Diastolic blood pressure, mmHg.
    pub dbp: Option<String>,
    /// Current smoking status.
    pub csm: Option<String>,
}

/// A validated patient record.
///
/// Numeric fields are already parsed and range-checked. The categorical
/// fields keep the caller's text; the encoder decides how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInput {
    /// Years.
    pub age: u32,
    /// Kilograms.
    pub weight: u32,
    /// Centimetres.
    pub height: u32,
    pub sex: String,
    pub diabetic: String,
    /// mmHg.
    pub systolic_bp: i32,
    /// mmHg.
    pub diastolic_bp: i32,
    pub smoking_status: String,
}

impl PatientInput {
    /// Body-mass index: weight / (height in metres)².
    pub fn bmi(&self) -> f64 {
        let metres = f64::from(self.height) / 100.0;
        f64::from(self.weight) / (metres * metres)
    }
}

impl From<&PatientInput> for RawPatientForm {
    fn from(input: &PatientInput) -> Self {
        Self {
            age: Some(input.age.to_string()),
            weight: Some(input.weight.to_string()),
            height: Some(input.height.to_string()),
            sex: Some(input.sex.clone()),
            diabetic: Some(input.diabetic.clone()),
            sbp: Some(input.systolic_bp.to_string()),
            dbp: Some(input.diastolic_bp.to_string()),
            csm: Some(input.smoking_status.clone()),
        }
    }
}
