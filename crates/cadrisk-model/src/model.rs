//! Frozen classifier artifacts.
//!
//! A model artifact is a JSON document tagged by `kind`:
//!
//! ```json
//! { "kind": "mlp",
//!   "layers": [ { "weights": [[...], ...], "biases": [...], "activation": "relu" },
//!               { "weights": [[...]],      "biases": [b],   "activation": "logistic" } ],
//!   "threshold": 0.5 }
//! ```
//!
//! `weights[j][i]` is the weight from input `i` to unit `j`. The last layer
//! must have exactly one unit; its (logistic) output is the probability of
//! class 1.

use serde::{Deserialize, Serialize};

use cadrisk_contracts::error::{CadError, CadResult};
use cadrisk_core::traits::{ensure_width, Classifier};

fn default_threshold() -> f64 {
    0.5
}

/// Elementwise activation of a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Identity,
    Relu,
    Tanh,
    Logistic,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Logistic => sigmoid(x),
        }
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// One fully connected layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| {
                let z: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias;
                self.activation.apply(z)
            })
            .collect()
    }
}

/// Serialized form of `MlpClassifier`, checked by `MlpClassifier::new`.
#[derive(Deserialize)]
struct MlpDocument {
    layers: Vec<DenseLayer>,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

/// A multi-layer perceptron classifier with a single logistic output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MlpDocument")]
pub struct MlpClassifier {
    layers: Vec<DenseLayer>,
    threshold: f64,
}

impl TryFrom<MlpDocument> for MlpClassifier {
    type Error = CadError;

    fn try_from(doc: MlpDocument) -> CadResult<Self> {
        Self::new(doc.layers, doc.threshold)
    }
}

impl MlpClassifier {
    /// Build an MLP, checking that consecutive layer shapes line up.
    pub fn new(layers: Vec<DenseLayer>, threshold: f64) -> CadResult<Self> {
        let first = layers
            .first()
            .ok_or_else(|| CadError::config("mlp artifact has no layers"))?;
        if first.inputs() == 0 {
            return Err(CadError::config("mlp input layer has zero inputs"));
        }

        let mut width = first.inputs();
        for (idx, layer) in layers.iter().enumerate() {
            if layer.weights.is_empty() {
                return Err(CadError::config(format!("mlp layer {idx} has no units")));
            }
            if layer.biases.len() != layer.weights.len() {
                return Err(CadError::config(format!(
                    "mlp layer {idx} has {} units but {} biases",
                    layer.weights.len(),
                    layer.biases.len()
                )));
            }
            if let Some(row) = layer.weights.iter().position(|r| r.len() != width) {
                return Err(CadError::config(format!(
                    "mlp layer {idx} unit {row} expects {} inputs, previous layer yields {width}",
                    layer.weights[row].len()
                )));
            }
            width = layer.weights.len();
        }
        if width != 1 {
            return Err(CadError::config(format!(
                "mlp output layer must have exactly one unit, found {width}"
            )));
        }
        check_threshold(threshold)?;
        Ok(Self { layers, threshold })
    }
}

impl Classifier for MlpClassifier {
    fn input_width(&self) -> usize {
        self.layers.first().map(DenseLayer::inputs).unwrap_or(0)
    }

    fn score(&self, row: &[f64]) -> CadResult<f64> {
        ensure_width(row, self.input_width())?;
        let mut activations = row.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }
        let score = activations.first().copied().ok_or_else(|| CadError::Model {
            reason: "mlp produced no output".to_string(),
        })?;
        finite(score)
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[derive(Deserialize)]
struct LogisticDocument {
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

/// Logistic regression: `sigmoid(w·x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LogisticDocument")]
pub struct LogisticClassifier {
    coefficients: Vec<f64>,
    intercept: f64,
    threshold: f64,
}

impl TryFrom<LogisticDocument> for LogisticClassifier {
    type Error = CadError;

    fn try_from(doc: LogisticDocument) -> CadResult<Self> {
        Self::new(doc.coefficients, doc.intercept, doc.threshold)
    }
}

impl LogisticClassifier {
    pub fn new(coefficients: Vec<f64>, intercept: f64, threshold: f64) -> CadResult<Self> {
        if coefficients.is_empty() {
            return Err(CadError::config("logistic artifact has no coefficients"));
        }
        check_threshold(threshold)?;
        Ok(Self { coefficients, intercept, threshold })
    }
}

impl Classifier for LogisticClassifier {
    fn input_width(&self) -> usize {
        self.coefficients.len()
    }

    fn score(&self, row: &[f64]) -> CadResult<f64> {
        ensure_width(row, self.input_width())?;
        let z: f64 = self
            .coefficients
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        finite(sigmoid(z))
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// A model artifact as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Mlp(MlpClassifier),
    Logistic(LogisticClassifier),
}

impl ModelArtifact {
    /// Parse and validate a model artifact.
    ///
    /// Both classifiers deserialize through their constructors, so a parsed
    /// artifact always has consistent layer shapes.
    pub fn from_json_str(s: &str) -> CadResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| CadError::config(format!("failed to parse model artifact: {}", e)))
    }

    /// Turn the artifact into a boxed classifier.
    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ModelArtifact::Mlp(m) => Box::new(m),
            ModelArtifact::Logistic(m) => Box::new(m),
        }
    }

    pub fn input_width(&self) -> usize {
        match self {
            ModelArtifact::Mlp(m) => m.input_width(),
            ModelArtifact::Logistic(m) => m.input_width(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::Mlp(_) => "mlp",
            ModelArtifact::Logistic(_) => "logistic",
        }
    }
}

fn check_threshold(threshold: f64) -> CadResult<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CadError::config(format!(
            "decision threshold must lie in [0, 1], got {threshold}"
        )));
    }
    Ok(())
}

fn finite(score: f64) -> CadResult<f64> {
    if score.is_finite() {
        Ok(score)
    } else {
        Err(CadError::Model {
            reason: format!("model produced a non-finite score ({score})"),
        })
    }
}
