//! `[page]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [page]
//! url = "http://127.0.0.1:8080/"   # Page served by the dev server
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ConfigDiagnostics, FieldPath};

/// Page the client attaches to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Absolute `http`/`https` URL of the page.
    pub url: Option<String>,
}

impl PageConfig {
    pub const URL: FieldPath = FieldPath::new("page.url");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let Some(raw) = &self.url else {
            diag.error_with_hint(
                Self::URL,
                "no page to attach to",
                "pass the page URL as argument or set `url` under [page]",
            );
            return;
        };

        match Url::parse(raw) {
            Ok(url) if !matches!(url.scheme(), "http" | "https") => {
                diag.error(Self::URL, format!("unsupported scheme `{}`", url.scheme()));
            }
            Ok(url) if url.host_str().is_none() => {
                diag.error(Self::URL, "URL has no host");
            }
            Ok(_) => {}
            Err(e) => diag.error(Self::URL, format!("invalid URL `{raw}`: {e}")),
        }
    }
}
