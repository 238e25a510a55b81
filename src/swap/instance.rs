//! Live instances.
//!
//! An instance is shared as `Arc<Instance>`; that pointer is its identity and
//! is never replaced by a swap. What changes is the table it dispatches
//! through, held behind an atomically swappable reference.
//!
//! # Lazy migration
//!
//! ```text
//! call(op) --> current table superseded? --no--> run op
//!                       | yes
//!                       v
//!          CAS current -> successor --lost--> re-dispatch (someone else migrated)
//!                       | won
//!                       v
//!          adopt(previous) on the new table, then re-dispatch op
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;

use super::behavior::{ADOPT, Behavior, Call};
use super::CallError;

pub struct Instance {
    behavior: ArcSwap<Behavior>,
    state: Mutex<Value>,
}

impl Instance {
    pub(crate) fn new(behavior: Arc<Behavior>, state: Value) -> Self {
        Self {
            behavior: ArcSwap::new(behavior),
            state: Mutex::new(state),
        }
    }

    /// Table this instance currently dispatches through.
    pub fn behavior(&self) -> Arc<Behavior> {
        self.behavior.load_full()
    }

    /// Instance state. Do not hold the guard across another call on the same instance.
    pub fn state(&self) -> MutexGuard<'_, Value> {
        self.state.lock()
    }

    /// Invoke operation `op`.
    pub fn call(self: &Arc<Self>, op: &str, args: &[Value]) -> Result<Value, CallError> {
        self.invoke(op, args, None)
    }

    fn invoke(
        self: &Arc<Self>,
        op: &str,
        args: &[Value],
        previous: Option<&Arc<Behavior>>,
    ) -> Result<Value, CallError> {
        loop {
            let current = self.behavior.load_full();
            let Some(next) = current.successor() else {
                let f = current
                    .operation(op)
                    .ok_or_else(|| CallError::UnknownOperation {
                        behavior: current.name().to_string(),
                        op: op.to_string(),
                    })?;
                return f(Call {
                    instance: self,
                    args,
                    previous,
                });
            };

            // Only the caller whose swap lands runs adopt; everyone else just
            // re-dispatches through whatever table the instance is on now
            let prior = self.behavior.compare_and_swap(&current, Arc::clone(&next));
            if !Arc::ptr_eq(&prior, &current) {
                continue;
            }

            crate::debug!("swap"; "instance migrated to new `{}`", next.name());
            // adopt runs on the table just reached; later links migrate on the next pass
            if op != ADOPT
                && let Some(adopt) = next.operation(ADOPT)
            {
                adopt(Call {
                    instance: self,
                    args: &[],
                    previous: Some(&current),
                })?;
            }
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("behavior", &self.behavior.load().name())
            .field("state", &*self.state.lock())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
