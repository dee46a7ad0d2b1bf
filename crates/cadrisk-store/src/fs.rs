//! Filesystem plot store.
//!
//! Plots are written under the static directory the HTTP layer serves, so
//! the returned URL resolves as soon as `store()` returns. Each file is
//! staged in a separate, unserved directory and renamed into place, so a
//! reader never sees a half-written image. The staging directory must live
//! on the same filesystem as the plot directory.
//!
//! The plot directory is bounded: after every write the oldest plots beyond
//! `max_plots` are removed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use cadrisk_contracts::error::{CadError, CadResult};
use cadrisk_core::traits::PlotStore;

use crate::validate_key;

/// Plots kept on disk when no limit is configured.
pub const DEFAULT_MAX_PLOTS: usize = 200;

/// Writes plots to `dir/<key>` and serves them as `url_prefix/<key>`.
#[derive(Debug, Clone)]
pub struct FsPlotStore {
    dir: PathBuf,
    staging_dir: PathBuf,
    url_prefix: String,
    max_plots: usize,
}

impl FsPlotStore {
    /// Create the store, creating `dir` and `staging_dir` if needed.
    ///
    /// `staging_dir` must not be `dir` or lie inside it.
    pub fn new(
        dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
    ) -> CadResult<Self> {
        let dir = dir.into();
        let staging_dir = staging_dir.into();
        if staging_dir.starts_with(&dir) {
            return Err(CadError::Storage {
                reason: format!(
                    "staging directory '{}' must be outside the plot directory '{}'",
                    staging_dir.display(),
                    dir.display()
                ),
            });
        }
        for d in [&dir, &staging_dir] {
            std::fs::create_dir_all(d).map_err(|e| CadError::Storage {
                reason: format!("failed to create directory '{}': {}", d.display(), e),
            })?;
        }
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Ok(Self {
            dir,
            staging_dir,
            url_prefix,
            max_plots: DEFAULT_MAX_PLOTS,
        })
    }

    /// Keep at most `max_plots` files in the plot directory (minimum 1).
    pub fn with_max_plots(mut self, max_plots: usize) -> Self {
        self.max_plots = max_plots.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_plots(&self) -> usize {
        self.max_plots
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }

    /// Remove the oldest plots until at most `max_plots` remain.
    ///
    /// `keep` is never removed. Files whose names are not valid keys are
    /// left alone. Returns the number of files removed.
    pub fn prune(&self, keep: &str) -> CadResult<usize> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| CadError::Storage {
            reason: format!("failed to list plot directory '{}': {}", self.dir.display(), e),
        })?;

        let mut plots: Vec<(SystemTime, String)> = Vec::new();
        let mut total = 0usize;
        for entry in entries.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file || validate_key(&name).is_err() {
                continue;
            }
            total += 1;
            if name == keep {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            plots.push((modified, name));
        }

        if total <= self.max_plots {
            return Ok(0);
        }
        plots.sort();

        let mut removed = 0;
        for (_, name) in plots.into_iter().take(total - self.max_plots) {
            match std::fs::remove_file(self.dir.join(&name)) {
                Ok(()) => removed += 1,
                // A concurrent prune got there first.
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CadError::Storage {
                        reason: format!("failed to remove old plot '{}': {}", name, e),
                    })
                }
            }
        }
        Ok(removed)
    }
}

impl PlotStore for FsPlotStore {
    fn store(&self, key: &str, bytes: &[u8]) -> CadResult<String> {
        validate_key(key)?;
        let target = self.dir.join(key);
        let staging = self.staging_dir.join(format!("{key}.part"));

        std::fs::write(&staging, bytes).map_err(|e| CadError::Storage {
            reason: format!("failed to write plot '{}': {}", staging.display(), e),
        })?;
        std::fs::rename(&staging, &target).map_err(|e| {
            let _ = std::fs::remove_file(&staging);
            CadError::Storage {
                reason: format!("failed to move plot into '{}': {}", target.display(), e),
            }
        })?;
        debug!(path = %target.display(), bytes = bytes.len(), "plot written");

        // The plot itself is in place; a failed cleanup must not fail the request.
        match self.prune(key) {
            Ok(0) => {}
            Ok(removed) => debug!(removed, max_plots = self.max_plots, "old plots pruned"),
            Err(e) => warn!(error = %e, "plot retention pass failed"),
        }
        Ok(self.url_for(key))
    }
}
