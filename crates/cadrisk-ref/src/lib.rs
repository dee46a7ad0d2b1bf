//! # cadrisk-ref
//!
//! Reference runtime for the CADRISK pipeline.
//!
//! Bundles a fictional model, scaler, and background sample, plus canned
//! patients that walk the pipeline through its main paths. Used by the
//! `cadrisk run-reference` command and by end-to-end tests. No files are
//! read and no external systems are contacted.

pub mod artifacts;
pub mod scenarios;

pub use artifacts::{assemble, build_reference_assessor, reference_artifacts};
pub use scenarios::{reference_patients, run_all, ReferencePatient, ScenarioOutcome};

// ── Tests ─────────────────────────────────────────────────────────────────────
