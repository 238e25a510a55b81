//! Change handlers, keyed by file extension.
//!
//! A [`HookRegistry`] maps an extension to a factory. The factory runs once
//! per changed target; the handler it returns lives in the [`HandlerCache`]
//! for the rest of the page's lifetime and may keep per-target state.
//!
//! # Handlers
//!
//! | Extension | Handler | On change |
//! |-----------|---------|-----------|
//! | `html` | [`HtmlHandler`] | soft reload when the page itself changed |
//! | `js` | [`ModuleHandler`] | hot swap of the module |
//! | other | none | [`patch_links`] |
//!
//! A handler answering "not handled" (or failing) falls back to
//! [`patch_links`]; the client does the full reload if that matches nothing.

mod dom;
mod html;
mod module;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use thiserror::Error;
use url::Url;

use crate::core::TargetId;
use crate::page::SharedPage;
use crate::swap::{SwapEngine, SwapError};

pub use dom::patch_links;
pub use html::{HtmlHandler, same_page};
pub use module::ModuleHandler;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error("{0}")]
    Other(String),
}

/// What a handler gets to work with.
pub struct HandlerContext<'a> {
    pub page: &'a SharedPage,
    pub swap: &'a SwapEngine,
}

/// What a handler did with a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    /// Left to [`patch_links`]
    Unhandled,
    /// Applied in place
    Handled,
    /// Applied by reloading the page; nothing is left to notify
    Reloaded,
}

impl From<bool> for Handling {
    fn from(handled: bool) -> Self {
        if handled { Self::Handled } else { Self::Unhandled }
    }
}

/// Per-target change handler.
#[async_trait]
pub trait TargetHandler: Send {
    /// React to a change of the handler's target.
    ///
    /// `new_target` is the cache-busted URL.
    async fn handle(
        &mut self,
        cx: &HandlerContext<'_>,
        new_target: &Url,
    ) -> Result<Handling, HandlerError>;
}

pub type HandlerFactory = Arc<dyn Fn(&TargetId) -> Box<dyn TargetHandler> + Send + Sync>;

// =============================================================================
// Registry
// =============================================================================

#[derive(Clone, Default)]
pub struct HookRegistry {
    factories: FxHashMap<String, HandlerFactory>,
}

impl HookRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `html` and `js` hooks.
    pub fn with_defaults() -> Self {
        let mut hooks = Self::new();
        hooks.register("html", |target| Box::new(HtmlHandler::new(target)));
        hooks.register("js", |target| Box::new(ModuleHandler::new(target)));
        hooks
    }

    /// Register (or replace) the factory for `extension`.
    pub fn register<F>(&mut self, extension: impl Into<String>, factory: F)
    where
        F: Fn(&TargetId) -> Box<dyn TargetHandler> + Send + Sync + 'static,
    {
        self.factories.insert(extension.into(), Arc::new(factory));
    }

    pub fn resolve(&self, extension: &str) -> Option<&HandlerFactory> {
        self.factories.get(extension)
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<_> = self.factories.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

// =============================================================================
// Handler cache
// =============================================================================

/// Handler per target, created on first change and never evicted.
///
/// A `None` slot records that no hook exists for the target's extension.
#[derive(Default)]
pub struct HandlerCache {
    slots: FxHashMap<TargetId, Option<Box<dyn TargetHandler>>>,
}

impl HandlerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handler for `target`, creating it through `hooks` on first use.
    pub fn get_or_create(
        &mut self,
        target: &TargetId,
        hooks: &HookRegistry,
    ) -> Option<&mut Box<dyn TargetHandler>> {
        self.slots
            .entry(target.clone())
            .or_insert_with(|| {
                let factory = hooks.resolve(target.extension())?;
                crate::debug!("change"; "new `{}` handler for {}", target.extension(), target);
                Some(factory(target))
            })
            .as_mut()
    }

    pub fn contains(&self, target: &TargetId) -> bool {
        self.slots.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
