//! Hot module swap.
//!
//! Replaces the code of a running module without reloading the page. Live
//! instances keep their identity and state; only the dispatch table they go
//! through changes, lazily on their next call.
//!
//! # Swap Steps
//!
//! ```text
//! load(original, previous, next)   concurrent, bounded by a timeout
//!         |
//!         v
//! carry "on reloaded" list and file tag   previous default -> next default
//! ensure `adopt` on both default exports
//!         |
//!         v
//! per export of next:
//!     previous table forwards to next table
//!     original setter rebinds the export
//!         |
//!         v
//! run "on reloaded" callbacks
//! ```
//!
//! # Module Structure
//!
//! - `behavior` - dispatch tables and their successor links
//! - `instance` - live instances, lazy migration
//! - `module` - loaded versions, setters, bindings
//! - `loader` - memoized loads, hot-module set

mod behavior;
mod instance;
mod loader;
mod module;


use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub use behavior::{
    ADOPT, Behavior, BehaviorBuilder, Call, Operation, ReloadCallback, ReloadCallbacks, noop,
};
pub use instance::Instance;
pub use loader::{ModuleCache, ModuleSource, NoModules, RAW_KEY};
pub use module::{Bindings, DEFAULT_EXPORT, Export, Module, ModuleBuilder, Setter, Setters};

// =============================================================================
// Errors
// =============================================================================

/// Failure of an operation invoked on an instance.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    #[error("`{behavior}` has no operation `{op}`")]
    UnknownOperation { behavior: String, op: String },

    #[error("{0}")]
    Failed(String),
}

/// Failure to load a module version.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("module `{url}` not found")]
    NotFound { url: Url },

    #[error("failed to load `{url}`: {message}")]
    Failed { url: Url, message: String },
}

#[derive(Debug, Error)]
pub enum SwapError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("`{0}` exposes no setters, module is not hot")]
    NoSetters(Url),

    #[error("`{url}` has no setter for export `{export}`")]
    MissingSetter { url: Url, export: String },

    #[error("module loads did not settle within {0:?}")]
    Timeout(Duration),
}

impl SwapError {
    /// Whether the page has to be reloaded in full.
    ///
    /// A plain load failure is left to the caller's escalation path; the
    /// others mean the module cannot be migrated in place.
    pub fn forces_reload(&self) -> bool {
        !matches!(self, Self::Load(_))
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Default bound on the three module loads of one swap.
pub const DEFAULT_SWAP_TIMEOUT: Duration = Duration::from_secs(10);

/// The three module versions one swap works with.
#[derive(Debug, Clone)]
pub struct Versions {
    /// First-ever load; owns the setters map
    pub original: Arc<Module>,
    /// Last swapped-in version; owns the live tables
    pub previous: Arc<Module>,
    /// Fresh version being swapped in
    pub next: Arc<Module>,
}

/// Outcome of a completed swap.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SwapReport {
    /// Tables that now forward to a successor
    pub forwarded: usize,
    /// Exports rebound through a setter
    pub registered: usize,
    /// "On reloaded" callbacks invoked
    pub callbacks: usize,
}

#[derive(Debug, Clone)]
pub struct SwapEngine {
    modules: Arc<ModuleCache>,
    timeout: Duration,
}

impl SwapEngine {
    pub fn new(modules: Arc<ModuleCache>) -> Self {
        Self {
            modules,
            timeout: DEFAULT_SWAP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub fn modules(&self) -> &Arc<ModuleCache> {
        &self.modules
    }

    /// Load the three versions concurrently.
    pub async fn load(
        &self,
        original: &Url,
        previous: &Url,
        next: &Url,
    ) -> Result<Versions, SwapError> {
        let loads = async {
            tokio::try_join!(
                self.modules.load(original),
                self.modules.load(previous),
                self.modules.load(next),
            )
        };

        let (original, previous, next) = tokio::time::timeout(self.timeout, loads)
            .await
            .map_err(|_| SwapError::Timeout(self.timeout))??;

        Ok(Versions {
            original,
            previous,
            next,
        })
    }

    /// Migrate from `versions.previous` to `versions.next`.
    ///
    /// Nothing is mutated unless every export of the next version has a
    /// setter in the original.
    pub fn apply(&self, versions: &Versions) -> Result<SwapReport, SwapError> {
        let Versions {
            original,
            previous,
            next,
        } = versions;

        let setters = original
            .setters()
            .ok_or_else(|| SwapError::NoSetters(original.url().clone()))?;
        if let Some((name, _)) = next.exports().iter().find(|(n, _)| setters.get(n).is_none()) {
            return Err(SwapError::MissingSetter {
                url: original.url().clone(),
                export: name.clone(),
            });
        }

        let old_default = previous.default_behavior();
        let new_default = next.default_behavior();
        if let (Some(old), Some(new)) = (old_default, new_default)
            && !Arc::ptr_eq(old, new)
        {
            if let Some(list) = old.on_reloaded() {
                new.set_on_reloaded(list);
            }
            if let Some(file) = old.file() {
                new.set_file(file);
            }
        }
        for default in [old_default, new_default].into_iter().flatten() {
            default.ensure_operation(ADOPT, noop());
        }

        let mut report = SwapReport::default();
        for (name, export) in next.exports() {
            let old = previous.export(name).and_then(Export::behavior);
            if let (Some(old), Some(new)) = (old, export.behavior())
                && !Arc::ptr_eq(old, new)
            {
                old.forward_to(Arc::clone(new));
                report.forwarded += 1;
            }

            if let Some(setter) = setters.get(name) {
                setter(export.clone());
                report.registered += 1;
            }
        }

        // Snapshot so a callback may register further callbacks
        let callbacks = new_default
            .and_then(|b| b.on_reloaded())
            .map(|list| list.lock().clone())
            .unwrap_or_default();
        for callback in &callbacks {
            callback();
        }
        report.callbacks = callbacks.len();

        crate::debug!(
            "swap";
            "{}: {} forwarded, {} rebound, {} callback(s)",
            next.url(), report.forwarded, report.registered, report.callbacks
        );
        Ok(report)
    }

    /// Load and apply in one step.
    pub async fn swap(
        &self,
        original: &Url,
        previous: &Url,
        next: &Url,
    ) -> Result<SwapReport, SwapError> {
        let versions = self.load(original, previous, next).await?;
        self.apply(&versions)
    }
}
