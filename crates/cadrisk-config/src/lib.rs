//! # cadrisk-config
//!
//! TOML configuration for the CADRISK service.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use cadrisk_config::ServiceConfig;
//!
//! let config = ServiceConfig::from_file(Path::new("assets/cadrisk.toml"))?;
//! let artifacts = cadrisk_model::load_artifacts(
//!     &config.model_source(),
//!     &config.scaler_source(),
//!     &config.background_source(),
//! )?;
//! ```

pub mod loader;
pub mod schema;

pub use schema::{
    ArtifactsSection, AttributionSection, PipelineSection, ServerSection, ServiceConfig,
    ValidationSection,
};

// ── Tests ─────────────────────────────────────────────────────────────────────
