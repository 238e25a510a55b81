//! `[channel]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [channel]
//! socket_path = "/.reserve/ws"   # WebSocket path on the dev server
//! reconnect_delay_ms = 1000      # Backoff after a close
//! reload_on_reconnect = false    # Hard reload when the server comes back
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::{RECONNECT_DELAY, SOCKET_PATH};
use crate::config::{ConfigDiagnostics, FieldPath};

/// Change notification channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub socket_path: String,

    /// Delay between a close and the next connect attempt.
    pub reconnect_delay_ms: u64,

    /// Reload the page when the channel reopens after having been open.
    pub reload_on_reconnect: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            socket_path: SOCKET_PATH.to_string(),
            reconnect_delay_ms: RECONNECT_DELAY.as_millis() as u64,
            reload_on_reconnect: false,
        }
    }
}

impl ChannelConfig {
    pub const SOCKET_PATH: FieldPath = FieldPath::new("channel.socket_path");
    pub const RECONNECT_DELAY: FieldPath = FieldPath::new("channel.reconnect_delay_ms");

    #[inline]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.socket_path.starts_with('/') {
            diag.error(Self::SOCKET_PATH, "must start with `/`");
        }
        if self.reconnect_delay_ms == 0 {
            diag.error_with_hint(
                Self::RECONNECT_DELAY,
                "a zero delay reconnects in a tight loop",
                "use the default of 1000",
            );
        }
    }
}
