//! Feature encoder: raw form fields → `PatientInput` → `FeatureVector`.
//!
//! Encoding rules:
//!
//! - Sex            = 1 iff the value is "male" (case-insensitive)
//! - DiabetesMellitus = 1 iff the value is "diabetic"
//! - CurrentSmoker  = 1 iff the value is "smoker"
//! - Hypertension   = 1 iff systolic ≥ 140 or diastolic ≥ 90
//! - Obesity        = 1 iff BMI ≥ 30, BMI = weight / (height / 100)²
//!
//! Age is emitted unscaled; the `Assessor` applies the fitted scaler
//! afterwards.

use serde::{Deserialize, Serialize};
use tracing::warn;

use cadrisk_contracts::{
    error::{CadError, CadResult},
    feature::{Feature, FeatureVector, FEATURE_COUNT},
    patient::{PatientInput, RawPatientForm},
};

/// Systolic pressure at or above which the patient counts as hypertensive.
pub const SYSTOLIC_THRESHOLD: i32 = 140;
/// Diastolic pressure at or above which the patient counts as hypertensive.
pub const DIASTOLIC_THRESHOLD: i32 = 90;
/// BMI at or above which the patient counts as obese.
pub const OBESITY_BMI: f64 = 30.0;

/// How categorical values outside the known vocabulary are handled.
///
/// `Lenient` treats any value that is not the positive category as the
/// negative one (and logs it). `Strict` only accepts the two known spellings
/// of each category and rejects everything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryPolicy {
    #[default]
    Lenient,
    Strict,
}

/// A categorical field: its wire name plus the positive and negative values.
struct Category {
    field: &'static str,
    positive: &'static str,
    negative: &'static str,
}

const SEX: Category = Category { field: "sex", positive: "male", negative: "female" };
const DIABETIC: Category = Category {
    field: "diabetic",
    positive: "diabetic",
    negative: "non-diabetic",
};
const SMOKER: Category = Category { field: "csm", positive: "smoker", negative: "non-smoker" };

/// Converts request fields into the model's fixed feature layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder {
    policy: CategoryPolicy,
}

impl FeatureEncoder {
    pub fn new(policy: CategoryPolicy) -> Self {
        Self { policy }
    }

    /// Parse and range-check the wire form.
    ///
    /// Fails on the first missing or malformed field, in form order.
    pub fn parse(&self, form: &RawPatientForm) -> CadResult<PatientInput> {
        let input = PatientInput {
            age: positive("age", &form.age)?,
            weight: positive("weight", &form.weight)?,
            height: positive("height", &form.height)?,
            sex: text("sex", &form.sex)?,
            diabetic: text("diabetic", &form.diabetic)?,
            systolic_bp: integer("sbp", &form.sbp)?,
            diastolic_bp: integer("dbp", &form.dbp)?,
            smoking_status: text("csm", &form.csm)?,
        };

        // Strict mode fails here, before encoding. Lenient mode only warns,
        // and does so once, from `encode`.
        if self.policy == CategoryPolicy::Strict {
            self.indicator(&SEX, &input.sex)?;
            self.indicator(&DIABETIC, &input.diabetic)?;
            self.indicator(&SMOKER, &input.smoking_status)?;
        }

        Ok(input)
    }

    /// Encode a validated record. Age is left unscaled.
    pub fn encode(&self, input: &PatientInput) -> CadResult<FeatureVector> {
        if input.height == 0 {
            return Err(CadError::invalid("height", "must be greater than zero"));
        }

        let bmi = input.bmi();
        let hypertensive = input.systolic_bp >= SYSTOLIC_THRESHOLD
            || input.diastolic_bp >= DIASTOLIC_THRESHOLD;

        let mut values = [0.0; FEATURE_COUNT];
        values[Feature::Age.index()] = f64::from(input.age);
        values[Feature::Sex.index()] = self.indicator(&SEX, &input.sex)?;
        values[Feature::DiabetesMellitus.index()] = self.indicator(&DIABETIC, &input.diabetic)?;
        values[Feature::Hypertension.index()] = flag(hypertensive);
        values[Feature::CurrentSmoker.index()] = self.indicator(&SMOKER, &input.smoking_status)?;
        values[Feature::Obesity.index()] = flag(bmi >= OBESITY_BMI);

        Ok(FeatureVector::new(values))
    }

    /// `parse` followed by `encode`.
    pub fn encode_form(&self, form: &RawPatientForm) -> CadResult<FeatureVector> {
        let input = self.parse(form)?;
        self.encode(&input)
    }

    fn indicator(&self, category: &Category, value: &str) -> CadResult<f64> {
        let normalized = value.trim().to_lowercase();
        if normalized == category.positive {
            return Ok(1.0);
        }
        if normalized == category.negative {
            return Ok(0.0);
        }
        match self.policy {
            CategoryPolicy::Strict => Err(CadError::invalid(
                category.field,
                format!(
                    "expected '{}' or '{}', got '{}'",
                    category.positive, category.negative, value
                ),
            )),
            CategoryPolicy::Lenient => {
                warn!(
                    field = category.field,
                    value = %value,
                    "unrecognized category, treating as '{}'",
                    category.negative
                );
                Ok(0.0)
            }
        }
    }
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

fn text(field: &str, value: &Option<String>) -> CadResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CadError::MissingField { field: field.to_string() }),
    }
}

fn integer(field: &str, value: &Option<String>) -> CadResult<i32> {
    let raw = text(field, value)?;
    raw.parse::<i32>()
        .map_err(|e| CadError::invalid(field, format!("'{}' is not an integer: {}", raw, e)))
}

fn positive(field: &str, value: &Option<String>) -> CadResult<u32> {
    let n = integer(field, value)?;
    if n <= 0 {
        return Err(CadError::invalid(field, "must be greater than zero"));
    }
    // n > 0 so the conversion cannot fail.
    Ok(n.unsigned_abs())
}
