//! In-memory implementation of `PlotStore`.
//!
//! Keeps every stored plot in a `HashMap` behind `Arc<Mutex<_>>`. Used by
//! the one-shot CLI commands and by tests that need to inspect what the
//! assessor stored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cadrisk_contracts::error::{CadError, CadResult};
use cadrisk_core::traits::PlotStore;

use crate::validate_key;

/// A plot store that never touches the filesystem.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct InMemoryPlotStore {
    url_prefix: String,
    plots: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryPlotStore {
    pub fn new(url_prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            plots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The bytes stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.plots.lock().ok()?.get(key).cloned()
    }

    /// Number of stored plots.
    pub fn len(&self) -> usize {
        self.plots.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .plots
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl Default for InMemoryPlotStore {
    fn default() -> Self {
        Self::new(crate::DEFAULT_URL_PREFIX)
    }
}

impl PlotStore for InMemoryPlotStore {
    fn store(&self, key: &str, bytes: &[u8]) -> CadResult<String> {
        validate_key(key)?;
        let mut plots = self.plots.lock().map_err(|e| CadError::Storage {
            reason: format!("plot store lock poisoned: {}", e),
        })?;
        plots.insert(key.to_string(), bytes.to_vec());
        Ok(format!("{}/{}", self.url_prefix, key))
    }
}
