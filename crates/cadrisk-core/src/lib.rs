//! # cadrisk-core
//!
//! The coronary-artery-disease risk assessment pipeline.
//!
//! This crate provides:
//! - The four pipeline seams (`Classifier`, `Explainer`, `PlotRenderer`, `PlotStore`)
//! - The feature encoder, the fitted age scaler, and the recommendation table
//! - The `Assessor` that runs one request through every stage in order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cadrisk_core::{Assessor, traits::{Classifier, Explainer, PlotRenderer, PlotStore}};
//! ```

pub mod assessor;
pub mod encoder;
pub mod recommend;
pub mod scaler;
pub mod traits;

pub use assessor::{Assessor, AssessorSettings, ExplanationFailurePolicy};
