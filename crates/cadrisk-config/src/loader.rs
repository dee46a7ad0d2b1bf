//! Loading `ServiceConfig` from TOML and turning it into runtime settings.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use cadrisk_contracts::error::{CadError, CadResult};
use cadrisk_core::AssessorSettings;
use cadrisk_explain::KernelConfig;
use cadrisk_model::ArtifactSource;

use crate::schema::ServiceConfig;

impl ServiceConfig {
    /// Parse `s` as TOML.
    ///
    /// Relative paths are kept as written; use `from_file` to anchor them.
    /// Returns `CadError::Config` if the TOML is malformed, names an unknown
    /// field, or fails validation.
    pub fn from_toml_str(s: &str) -> CadResult<Self> {
        let config: ServiceConfig = toml::from_str(s)
            .map_err(|e| CadError::config(format!("failed to parse config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse the file at `path`.
    ///
    /// Relative artifact and server paths are resolved against the
    /// directory containing the file, so the service can be started from
    /// any working directory.
    pub fn from_file(path: &Path) -> CadResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CadError::config(format!("failed to read config file '{}': {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Anchor every relative path in the config at `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.artifacts.model,
            &mut self.artifacts.scaler,
            &mut self.artifacts.background,
            &mut self.server.static_dir,
            &mut self.server.plot_staging_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    fn validate(&self) -> CadResult<()> {
        if self.attribution.background_size == 0 {
            return Err(CadError::config("attribution.background_size must be at least 1"));
        }
        if self.attribution.max_coalitions < 2 {
            return Err(CadError::config("attribution.max_coalitions must be at least 2"));
        }
        if self.server.max_plots == 0 {
            return Err(CadError::config("server.max_plots must be at least 1"));
        }
        if self.server.plot_staging_dir.starts_with(&self.server.static_dir) {
            return Err(CadError::config(format!(
                "server.plot_staging_dir '{}' must not be inside server.static_dir",
                self.server.plot_staging_dir.display()
            )));
        }
        if !self.server.plot_url_prefix.starts_with('/') {
            return Err(CadError::config(format!(
                "server.plot_url_prefix must start with '/', got '{}'",
                self.server.plot_url_prefix
            )));
        }
        for (name, digest) in [
            ("model_sha256", &self.artifacts.model_sha256),
            ("scaler_sha256", &self.artifacts.scaler_sha256),
            ("background_sha256", &self.artifacts.background_sha256),
        ] {
            if let Some(d) = digest {
                if d.len() != 64 || !d.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(CadError::config(format!(
                        "artifacts.{} must be 64 hex characters",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn model_source(&self) -> ArtifactSource {
        source(&self.artifacts.model, &self.artifacts.model_sha256)
    }

    pub fn scaler_source(&self) -> ArtifactSource {
        source(&self.artifacts.scaler, &self.artifacts.scaler_sha256)
    }

    pub fn background_source(&self) -> ArtifactSource {
        source(&self.artifacts.background, &self.artifacts.background_sha256)
    }

    /// Directory rendered plots are written to.
    pub fn plot_dir(&self) -> std::path::PathBuf {
        self.server.static_dir.join("assets").join("img")
    }

    pub fn assessor_settings(&self) -> AssessorSettings {
        AssessorSettings {
            categories: self.validation.categories,
            on_explanation_failure: self.pipeline.on_explanation_failure,
        }
    }

    pub fn kernel_config(&self) -> KernelConfig {
        KernelConfig {
            background_size: self.attribution.background_size,
            max_coalitions: self.attribution.max_coalitions,
            seed: self.attribution.seed,
            timeout: self.attribution.timeout_ms.map(Duration::from_millis),
            output: self.attribution.explain_output,
        }
    }
}

fn source(path: &Path, sha256: &Option<String>) -> ArtifactSource {
    match sha256 {
        Some(d) => ArtifactSource::pinned(path, d.clone()),
        None => ArtifactSource::new(path),
    }
}
