//! # cadrisk-explain
//!
//! Local explanations for CADRISK predictions.
//!
//! - `KernelExplainer`: model-agnostic Kernel SHAP over a background sample
//! - `BarChartRenderer`: PNG bar chart of one attribution
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cadrisk_explain::{KernelConfig, KernelExplainer, BarChartRenderer};
//!
//! let explainer = KernelExplainer::new(&background, KernelConfig::default())?;
//! let attribution = explainer.explain(model.as_ref(), row, &Feature::names())?;
//! let png = BarChartRenderer::default().render(&attribution)?;
//! ```

pub mod coalition;
pub mod kernel;
pub mod render;
pub mod solve;

pub use kernel::{ExplainedOutput, KernelConfig, KernelExplainer};
pub use render::BarChartRenderer;

// ── Tests ─────────────────────────────────────────────────────────────────────
