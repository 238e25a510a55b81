//! Client Message Definitions
//!
//! Requests from the page and the embedder to the client loop.
//!
//! ```text
//! Page / ClientHandle --ClientMsg--> LiveClient
//! ```

use serde_json::Value;

/// Messages to the client loop
#[derive(Debug)]
pub enum ClientMsg {
    /// Serialize and send (or queue) a broadcast payload
    SendBroadcast(Value),
    /// Stop the loop
    Shutdown,
}
