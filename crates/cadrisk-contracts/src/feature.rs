//! The fixed feature layout shared by the encoder, the model, and the
//! background sample.
//!
//! Feature order is part of the model contract: the frozen classifier and the
//! background rows were built with exactly this column order. Reordering the
//! `Feature` variants silently corrupts every prediction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 6;

/// One model input, in model column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    Age,
    Sex,
    DiabetesMellitus,
    Hypertension,
    CurrentSmoker,
    Obesity,
}

impl Feature {
    /// All features in model column order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Age,
        Feature::Sex,
        Feature::DiabetesMellitus,
        Feature::Hypertension,
        Feature::CurrentSmoker,
        Feature::Obesity,
    ];

    /// Column index of this feature in a `FeatureVector`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable display name, used in attribution output and CSV headers.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Age => "Age",
            Feature::Sex => "Sex",
            Feature::DiabetesMellitus => "DiabetesMellitus",
            Feature::Hypertension => "Hypertension",
            Feature::CurrentSmoker => "CurrentSmoker",
            Feature::Obesity => "Obesity",
        }
    }

    /// Feature names in column order.
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.name().to_string()).collect()
    }

    /// Look up a feature by name, ignoring case and whitespace
    /// ("Current Smoker" and "currentsmoker" both resolve).
    pub fn from_name(name: &str) -> Option<Feature> {
        let wanted: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.name().to_lowercase() == wanted)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The encoded model input.
///
/// `Age` holds the scaled age once the scaler has run; every other slot is a
/// 0/1 indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.values[feature.index()] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// True when the indicator for `feature` is set.
    pub fn is_active(&self, feature: Feature) -> bool {
        self.get(feature) >= 0.5
    }

    /// The recommendation-relevant indicators of this vector.
    pub fn risk_factors(&self) -> RiskFactorFlags {
        RiskFactorFlags {
            diabetes: self.is_active(Feature::DiabetesMellitus),
            hypertension: self.is_active(Feature::Hypertension),
            smoking: self.is_active(Feature::CurrentSmoker),
            obesity: self.is_active(Feature::Obesity),
        }
    }
}

/// Modifiable risk factors present in the encoded input.
///
/// Derived from the `FeatureVector` indicators, never from attribution values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactorFlags {
    pub diabetes: bool,
    pub hypertension: bool,
    pub smoking: bool,
    pub obesity: bool,
}
