//! `[ignore]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [ignore]
//! resource = "/.reserveignore"   # Server path of the ignore file
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::ignore::IGNORE_RESOURCE;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    pub resource: String,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            resource: IGNORE_RESOURCE.to_string(),
        }
    }
}

impl IgnoreConfig {
    pub const RESOURCE: FieldPath = FieldPath::new("ignore.resource");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.resource.starts_with('/') {
            diag.error(Self::RESOURCE, "must start with `/`");
        }
    }
}
