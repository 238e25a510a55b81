//! Core types - pure abstractions shared across the codebase.

mod url;

pub use self::url::{CACHE_BUST_KEY, TargetId, cache_bust_stamp, without_query};
