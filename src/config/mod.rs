//! Client configuration management for `reserve.toml`.
//!
//! The config file is optional: without one, defaults apply and the page URL
//! must come from the command line.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── page       # [page]
//! │   ├── channel    # [channel]
//! │   ├── ignore     # [ignore]
//! │   └── swap       # [swap]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, diagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # ClientConfig (this file)
//! ```
//!
//! # Precedence
//!
//! defaults < `reserve.toml` < command-line flags

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{ChannelConfig, IgnoreConfig, PageConfig, SwapConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::{channel, cli::Cli, log};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing reserve.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Config file the values were read from, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Page to attach to
    #[serde(default)]
    pub page: PageConfig,

    /// Change notification channel
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Ignore resource
    #[serde(default)]
    pub ignore: IgnoreConfig,

    /// Hot module swap
    #[serde(default)]
    pub swap: SwapConfig,
}

impl ClientConfig {
    /// Load configuration for the given command line.
    ///
    /// Searches upward from cwd for the config file; a missing file is not an
    /// error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = Some(path);
                config
            }
            None => {
                crate::debug!("config"; "no {}, using defaults", cli.config.display());
                Self::default()
            }
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-line overrides.
    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.url {
            self.page.url = Some(url.clone());
        }
        Self::update_option(&mut self.channel.reconnect_delay_ms, cli.reconnect_delay.as_ref());
        Self::update_option(
            &mut self.channel.reload_on_reconnect,
            cli.reload_on_reconnect.as_ref(),
        );
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(value) = cli_option {
            *config_option = value.clone();
        }
    }

    // ========================================================================
    // validation and derived values
    // ========================================================================

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.page.validate(&mut diag);
        self.channel.validate(&mut diag);
        self.ignore.validate(&mut diag);
        self.swap.validate(&mut diag);
        diag.into_result()
    }

    /// The page URL.
    pub fn page_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .page
            .url
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("no page URL configured".into()))?;
        Url::parse(raw).map_err(|e| ConfigError::Validation(format!("invalid page URL `{raw}`: {e}")))
    }

    /// WebSocket URL of the change channel for `page`.
    pub fn socket_url(&self, page: &Url) -> Result<Url, ConfigError> {
        channel::socket_url(page, &self.channel.socket_path)
            .ok_or_else(|| ConfigError::Validation(format!("no socket URL for page `{page}`")))
    }

    /// URL of the ignore resource for `page`.
    pub fn ignore_url(&self, page: &Url) -> Result<Url, ConfigError> {
        page.join(&self.ignore.resource)
            .map_err(|e| ConfigError::Validation(format!("invalid ignore resource: {e}")))
    }
}

/// Parse config, failing on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ClientConfig {
    let (parsed, ignored) = ClientConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
