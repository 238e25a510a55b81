//! reserve-live - live-update client for the reserve dev server.
//!
//! # Architecture
//!
//! ```text
//! Server --[change/stdin/broadcast]--> Channel --> LiveClient --> Handler --> Page
//!                                                     |             |
//!                                                  IgnoreFilter   SwapEngine
//! ```
//!
//! # Modules
//!
//! - `channel` - Transport connection, frame protocol, outbound queue
//! - `client` - `LiveClient` root component and change dispatch
//! - `config` - `reserve.toml` loading and CLI overrides
//! - `core` - Target identity and URL helpers
//! - `hooks` - Per-extension handler factories and the handler cache
//! - `ignore` - `/.reserveignore` prefix filter
//! - `net` - HTTP fetching of text resources
//! - `page` - Headless page model (document, observers, events)
//! - `swap` - Hot behavior swap engine

pub mod channel;
pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod hooks;
pub mod ignore;
pub mod logger;
pub mod net;
pub mod page;
pub mod swap;

pub use client::{ClientHandle, LiveClient};
pub use config::ClientConfig;
pub use core::TargetId;
pub use page::{Page, SharedPage};
