//! `[swap]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [swap]
//! timeout_ms = 10000   # Give up on module loads (and reload) after this
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::swap::DEFAULT_SWAP_TIMEOUT;

/// Hot module swap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Bound on the module loads of one swap.
    pub timeout_ms: u64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_SWAP_TIMEOUT.as_millis() as u64,
        }
    }
}

impl SwapConfig {
    pub const TIMEOUT: FieldPath = FieldPath::new("swap.timeout_ms");

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.timeout_ms == 0 {
            diag.error(Self::TIMEOUT, "must be positive");
        }
    }
}
