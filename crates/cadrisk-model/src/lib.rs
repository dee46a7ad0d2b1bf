//! # cadrisk-model
//!
//! Frozen artifacts for the CADRISK pipeline: the classifier, the fitted age
//! scaler, and the background sample drawn from the training data.
//!
//! Nothing here trains or fits. Artifacts are read once at startup,
//! fingerprinted, and handed to the `Assessor` as read-only values.
//!
//! ```rust,ignore
//! use cadrisk_model::artifacts::{load_artifacts, ArtifactSource};
//!
//! let loaded = load_artifacts(
//!     &ArtifactSource::new("assets/model.json"),
//!     &ArtifactSource::new("assets/scaler.json"),
//!     &ArtifactSource::new("assets/CAD.csv"),
//! )?;
//! ```

pub mod artifacts;
pub mod background;
pub mod model;

pub use artifacts::{load_artifacts, ArtifactSource, LoadedArtifacts};
pub use model::{Activation, DenseLayer, LogisticClassifier, MlpClassifier, ModelArtifact};
