//! Change notification channel.
//!
//! # Lifecycle
//!
//! ```text
//! Connecting --open--> Open --close/error--> Closed
//!     ^                                         |
//!     +---------- reconnect delay (1s) ---------+
//! ```
//!
//! There is no terminal state: a failed connect counts as a close and is
//! retried after the same delay. The client loop owns the state machine;
//! a [`Connector`] only reports what happened to one connection attempt.
//!
//! # Module Structure
//!
//! - `message` - inbound frame protocol
//! - `outbound` - broadcast queue and the link to an open connection
//! - `transport` - tungstenite connection thread

mod message;
mod outbound;
mod transport;

use std::time::Duration;

use tokio::sync::mpsc;
use url::Url;

pub use message::{InboundMessage, encode_broadcast};
pub use outbound::{Outbound, OutboundLink};
pub use transport::WsConnector;

/// Default delay between a close and the next connect.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Default socket path on the dev server.
pub const SOCKET_PATH: &str = "/.reserve/ws";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// What happened to a connection attempt.
#[derive(Debug)]
pub enum ChannelEvent {
    /// Connected; outbound payloads go to the link
    Open(OutboundLink),
    /// Inbound text frame
    Frame(String),
    /// Connection lost or never established
    Closed {
        /// Payloads taken from the link but not written
        unsent: Vec<String>,
    },
}

/// Starts connection attempts.
///
/// Each call makes one attempt and reports on `events`: either `Open`, any
/// number of `Frame`s and a final `Closed`, or just `Closed`.
pub trait Connector: Send + Sync {
    fn connect(&self, events: mpsc::UnboundedSender<ChannelEvent>);
}

/// Socket URL for a page: same host and port, `ws` for `http`, `wss` for `https`.
pub fn socket_url(page: &Url, path: &str) -> Option<Url> {
    let scheme = match page.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    let host = page.host_str()?;
    let authority = match page.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let path = path.trim_start_matches('/');
    Url::parse(&format!("{scheme}://{authority}/{path}")).ok()
}
