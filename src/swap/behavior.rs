//! Dispatch tables.
//!
//! A [`Behavior`] is the set of named operations an instance responds to.
//! Swapping never edits a table's operations in place: a superseded table
//! gets a successor link, and instances still pointing at it migrate on their
//! next call (see [`Instance`](super::Instance)).

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{CallError, Instance};

/// Migration hook an instance runs when its table changes.
pub const ADOPT: &str = "adopt";

/// Arguments of one operation invocation.
pub struct Call<'a> {
    pub instance: &'a Arc<Instance>,
    pub args: &'a [Value],
    /// Table the instance migrated away from (only set for `adopt`)
    pub previous: Option<&'a Arc<Behavior>>,
}

pub type Operation = Arc<dyn Fn(Call<'_>) -> Result<Value, CallError> + Send + Sync>;

/// Callback run after a module was swapped.
pub type ReloadCallback = Arc<dyn Fn() + Send + Sync>;

/// "On reloaded" list, shared (not copied) between versions of an export.
pub type ReloadCallbacks = Arc<Mutex<Vec<ReloadCallback>>>;

/// Administrative slots carried forward across swaps.
#[derive(Default)]
struct AdminSlots {
    on_reloaded: Option<ReloadCallbacks>,
    file: Option<String>,
}

pub struct Behavior {
    name: String,
    ops: RwLock<FxHashMap<String, Operation>>,
    /// Set once this table has been replaced
    successor: ArcSwapOption<Behavior>,
    admin: Mutex<AdminSlots>,
}

impl Behavior {
    pub fn builder(name: impl Into<String>) -> BehaviorBuilder {
        BehaviorBuilder {
            name: name.into(),
            ops: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self, name: &str) -> Option<Operation> {
        self.ops.read().get(name).cloned()
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.ops.read().contains_key(name)
    }

    /// Operation names, sorted.
    pub fn operation_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.ops.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Insert `op` under `name` unless the table already defines it.
    ///
    /// Returns true if inserted.
    pub fn ensure_operation(&self, name: &str, op: Operation) -> bool {
        let mut ops = self.ops.write();
        if ops.contains_key(name) {
            return false;
        }
        ops.insert(name.to_string(), op);
        true
    }

    /// Construct a live instance dispatching through this table.
    pub fn construct(self: &Arc<Self>, state: Value) -> Arc<Instance> {
        Arc::new(Instance::new(Arc::clone(self), state))
    }

    // =========================================================================
    // Succession
    // =========================================================================

    pub fn successor(&self) -> Option<Arc<Behavior>> {
        self.successor.load_full()
    }

    pub fn is_superseded(&self) -> bool {
        self.successor.load().is_some()
    }

    /// Make every operation of this table forward to `next`.
    pub(crate) fn forward_to(&self, next: Arc<Behavior>) {
        self.successor.store(Some(next));
    }

    // =========================================================================
    // Administrative slots
    // =========================================================================

    pub fn on_reloaded(&self) -> Option<ReloadCallbacks> {
        self.admin.lock().on_reloaded.clone()
    }

    pub fn set_on_reloaded(&self, callbacks: ReloadCallbacks) {
        self.admin.lock().on_reloaded = Some(callbacks);
    }

    /// Register a callback on this export's "on reloaded" list.
    ///
    /// Returns false if the export carries no list (module not hot-wrapped).
    pub fn add_reload_callback(&self, callback: impl Fn() + Send + Sync + 'static) -> bool {
        match self.on_reloaded() {
            Some(list) => {
                list.lock().push(Arc::new(callback));
                true
            }
            None => false,
        }
    }

    /// File-identity tag.
    pub fn file(&self) -> Option<String> {
        self.admin.lock().file.clone()
    }

    pub fn set_file(&self, file: impl Into<String>) {
        self.admin.lock().file = Some(file.into());
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("ops", &self.operation_names())
            .field("superseded", &self.is_superseded())
            .finish()
    }
}

/// Builder for [`Behavior`].
pub struct BehaviorBuilder {
    name: String,
    ops: FxHashMap<String, Operation>,
}

impl BehaviorBuilder {
    /// Add an operation.
    pub fn op<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Call<'_>) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.ops.insert(name.into(), Arc::new(f));
        self
    }

    pub fn build(self) -> Arc<Behavior> {
        Arc::new(Behavior {
            name: self.name,
            ops: RwLock::new(self.ops),
            successor: ArcSwapOption::empty(),
            admin: Mutex::new(AdminSlots::default()),
        })
    }
}

/// Operation that does nothing and returns `null`.
pub fn noop() -> Operation {
    fn nothing(_: Call<'_>) -> Result<Value, CallError> {
        Ok(Value::Null)
    }
    Arc::new(nothing)
}

// =============================================================================
// Tests
// =============================================================================
