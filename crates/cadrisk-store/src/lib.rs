//! # cadrisk-store
//!
//! Destinations for rendered attribution plots.
//!
//! - `FsPlotStore` writes under the served static directory and keeps at
//!   most `max_plots` files there
//! - `InMemoryPlotStore` keeps bytes in memory
//!
//! Keys come from the assessor (`shap_<assessment-id>.png`) and are unique
//! per request. Both stores refuse keys that could escape their directory.

pub mod fs;
pub mod memory;

pub use fs::{FsPlotStore, DEFAULT_MAX_PLOTS};
pub use memory::InMemoryPlotStore;

use cadrisk_contracts::error::{CadError, CadResult};

/// URL prefix plots are served under when none is configured.
pub const DEFAULT_URL_PREFIX: &str = "/static/assets/img";

/// Reject keys that are empty, hidden, or contain anything but
/// `[A-Za-z0-9._-]`.
pub fn validate_key(key: &str) -> CadResult<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if key.is_empty() || key.starts_with('.') || !key.chars().all(allowed) {
        return Err(CadError::Storage {
            reason: format!("invalid plot key '{}'", key),
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
