//! Page-level events.
//!
//! The source-change pre-notification is synchronous and cancelable, so it
//! goes through observers. Everything else is fire-and-forget and goes out on
//! the page event stream.

use serde_json::Value;

use super::ElementId;
use crate::core::TargetId;

/// Cancelable notification fired before any handling of a change.
#[derive(Debug)]
pub struct SourceChangeEvent {
    target: TargetId,
    canceled: bool,
}

impl SourceChangeEvent {
    pub fn new(target: TargetId) -> Self {
        Self {
            target,
            canceled: false,
        }
    }

    #[inline]
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    /// Veto the change: no handler runs and the page is left untouched.
    pub fn prevent_default(&mut self) {
        self.canceled = true;
    }

    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }
}

/// Receives source-change pre-notifications.
pub trait SourceChangeObserver: Send + Sync {
    fn on_source_change(&self, event: &mut SourceChangeEvent);
}

impl<F> SourceChangeObserver for F
where
    F: Fn(&mut SourceChangeEvent) + Send + Sync,
{
    fn on_source_change(&self, event: &mut SourceChangeEvent) {
        self(event)
    }
}

/// How a page reload treats caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    /// Plain reload (HTML changed).
    Soft,
    /// Uncached reload, the fallback when nothing else handled a change.
    Hard,
}

/// Events published to page subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// A console line piped from the server's stdin
    Stdin(String),
    /// A message relayed by the server from some client
    Broadcast(Value),
    /// An element that declared interest in `target` is told it changed
    ElementSourceChange { element: ElementId, target: TargetId },
    /// The page reloaded
    Reload(ReloadKind),
}
