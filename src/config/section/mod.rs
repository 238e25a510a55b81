//! Configuration section definitions.
//!
//! Each module corresponds to a section in `reserve.toml`:
//!
//! | Module    | TOML Section | Purpose                              |
//! |-----------|--------------|--------------------------------------|
//! | `page`    | `[page]`     | Page to attach to                    |
//! | `channel` | `[channel]`  | Socket path, reconnect behavior      |
//! | `ignore`  | `[ignore]`   | Ignore resource location             |
//! | `swap`    | `[swap]`     | Hot module swap timeout              |

mod channel;
mod ignore;
mod page;
mod swap;

pub use channel::ChannelConfig;
pub use ignore::IgnoreConfig;
pub use page::PageConfig;
pub use swap::SwapConfig;
