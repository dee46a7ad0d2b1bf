//! Error types for the CADRISK inference pipeline.
//!
//! All fallible operations in the CADRISK crates return `CadResult<T>`.
//! Variants carry enough context to produce a human-readable cause in the
//! HTTP error body.

use thiserror::Error;

/// The unified error type for the CADRISK pipeline.
#[derive(Debug, Error)]
pub enum CadError {
    /// A required request field was absent or empty.
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    /// A request field was present but could not be accepted.
    #[error("invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// The classifier could not score the input (shape mismatch, non-finite output).
    #[error("model error: {reason}")]
    Model { reason: String },

    /// The attribution engine could not be built or could not produce values.
    #[error("explanation error: {reason}")]
    Explanation { reason: String },

    /// The attribution computation exceeded its deadline.
    #[error("explanation timed out after {elapsed_ms} ms (limit {limit_ms} ms)")]
    ExplanationTimeout { elapsed_ms: u128, limit_ms: u128 },

    /// The attribution chart could not be rasterized or encoded.
    #[error("plot rendering failed: {reason}")]
    Render { reason: String },

    /// The rendered chart could not be persisted.
    #[error("plot storage failed: {reason}")]
    Storage { reason: String },

    /// A configuration value or startup artifact is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Coarse grouping of `CadError` variants.
///
/// `Validation` errors are caused by the request, `Computation` errors by the
/// pipeline while handling a valid request, `Configuration` errors by the
/// process setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Computation,
    Configuration,
}

impl CadError {
    /// Shorthand for an `InvalidField` error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `Config` error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Which part of the system this error originates from.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CadError::MissingField { .. } | CadError::InvalidField { .. } => ErrorKind::Validation,
            CadError::Model { .. }
            | CadError::Explanation { .. }
            | CadError::ExplanationTimeout { .. }
            | CadError::Render { .. }
            | CadError::Storage { .. } => ErrorKind::Computation,
            CadError::Config { .. } => ErrorKind::Configuration,
        }
    }
}

/// Convenience alias used throughout the CADRISK crates.
pub type CadResult<T> = Result<T, CadError>;
