//! Headless page model.
//!
//! Stands in for the browser page the client lives in:
//!
//! - `location` - URL the page was loaded from
//! - `document` - flat element store (links, notify targets)
//! - observers - cancelable source-change pre-notification
//! - event stream - stdin lines, broadcasts, element notifications, reloads
//!
//! # Module Structure
//!
//! - `document` - `Document`, `Element`, attribute names
//! - `event` - `SourceChangeEvent`, `PageEvent`, `ReloadKind`
//! - `load` - HTML to `Document` via tl

mod document;
mod event;
mod load;

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use url::Url;

pub use document::{
    ATTR_HREF, ATTR_IGNORE_EXPR, ATTR_NOTIFY_FILE, ATTR_ORIGINAL_HREF, ATTR_REL, Document,
    Element, ElementId, REL_IGNORE,
};
pub use event::{PageEvent, ReloadKind, SourceChangeEvent, SourceChangeObserver};

use crate::client::ClientMsg;
use crate::core::TargetId;

/// Page event stream capacity (slow subscribers lag, they never block the client)
const EVENT_CAPACITY: usize = 256;

/// Page shared between the client loop, handlers and the embedder.
pub type SharedPage = Arc<Mutex<Page>>;

/// Headless page.
pub struct Page {
    location: Url,
    document: Document,
    observers: Vec<Arc<dyn SourceChangeObserver>>,
    events: broadcast::Sender<PageEvent>,
    reloads: Vec<ReloadKind>,
    /// Set once a client is attached; carries "send broadcast" requests
    client: Option<mpsc::UnboundedSender<ClientMsg>>,
}

impl Page {
    pub fn new(location: Url, document: Document) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            location,
            document,
            observers: Vec::new(),
            events,
            reloads: Vec::new(),
            client: None,
        }
    }

    /// Wrap into the shared handle used by the client.
    pub fn shared(self) -> SharedPage {
        Arc::new(Mutex::new(self))
    }

    #[inline]
    pub fn location(&self) -> &Url {
        &self.location
    }

    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Replace the document (after a reload re-fetched it).
    pub fn replace_document(&mut self, document: Document) {
        self.document = document;
    }

    /// Resolve an element reference against the page location.
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        self.location.join(reference).ok()
    }

    // =========================================================================
    // Observers and events
    // =========================================================================

    pub fn add_observer(&mut self, observer: Arc<dyn SourceChangeObserver>) {
        self.observers.push(observer);
    }

    /// Snapshot of the observer list (called without holding the page lock).
    pub fn observers(&self) -> Vec<Arc<dyn SourceChangeObserver>> {
        self.observers.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: PageEvent) {
        // No subscribers is fine: the event simply has no audience
        let _ = self.events.send(event);
    }

    /// Reload the page.
    pub fn reload(&mut self, kind: ReloadKind) {
        crate::debug!("page"; "reload ({:?}) {}", kind, self.location);
        self.reloads.push(kind);
        self.emit(PageEvent::Reload(kind));
    }

    /// Reloads performed so far, oldest first.
    pub fn reloads(&self) -> &[ReloadKind] {
        &self.reloads
    }

    /// Tell every element interested in `target` that it changed.
    ///
    /// Returns the number of elements notified.
    pub fn notify_interested(&self, target: &TargetId) -> usize {
        let ids = self.document.by_attr(ATTR_NOTIFY_FILE, target.as_str());
        for &element in &ids {
            self.emit(PageEvent::ElementSourceChange {
                element,
                target: target.clone(),
            });
        }
        ids.len()
    }

    // =========================================================================
    // Outbound broadcast
    // =========================================================================

    pub(crate) fn attach_client(&mut self, client: mpsc::UnboundedSender<ClientMsg>) {
        self.client = Some(client);
    }

    /// Ask the attached client to broadcast `payload` to the server.
    ///
    /// Returns false when no running client is attached.
    pub fn send_broadcast(&self, payload: Value) -> bool {
        match &self.client {
            Some(tx) => tx.send(ClientMsg::SendBroadcast(payload)).is_ok(),
            None => {
                crate::debug!("page"; "broadcast dropped, no client attached");
                false
            }
        }
    }
}

/// Fire the cancelable source-change pre-notification.
///
/// Observers run outside the page lock so they may use the page themselves.
/// Returns `false` if any observer vetoed the change.
pub fn dispatch_source_change(page: &SharedPage, target: &TargetId) -> bool {
    let observers = page.lock().observers();
    let mut event = SourceChangeEvent::new(target.clone());
    for observer in observers {
        observer.on_source_change(&mut event);
    }
    !event.is_canceled()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(
            Url::parse("http://127.0.0.1:8080/index.html").unwrap(),
            Document::new(),
        )
    }

    #[test]
    fn test_dispatch_without_observers_proceeds() {
        let page = page().shared();
        let target = TargetId::parse("http://127.0.0.1:8080/a.css").unwrap();
        assert!(dispatch_source_change(&page, &target));
    }

    #[test]
    fn test_any_observer_can_veto() {
        let page = page().shared();
        page.lock().add_observer(Arc::new(|_: &mut SourceChangeEvent| {}));
        page.lock()
            .add_observer(Arc::new(|e: &mut SourceChangeEvent| {
                if e.target().path().ends_with(".map") {
                    e.prevent_default();
                }
            }));

        let css = TargetId::parse("http://127.0.0.1:8080/a.css").unwrap();
        let map = TargetId::parse("http://127.0.0.1:8080/a.css.map").unwrap();
        assert!(dispatch_source_change(&page, &css));
        assert!(!dispatch_source_change(&page, &map));
    }

    #[test]
    fn test_observer_may_lock_page() {
        let page = page().shared();
        let inner = Arc::clone(&page);
        page.lock()
            .add_observer(Arc::new(move |_: &mut SourceChangeEvent| {
                let _ = inner.lock().location();
            }));
        let target = TargetId::parse("http://127.0.0.1:8080/a.css").unwrap();
        assert!(dispatch_source_change(&page, &target));
    }

    #[test]
    fn test_notify_interested() {
        let mut page = page();
        let target = TargetId::parse("http://127.0.0.1:8080/data.json").unwrap();
        let id = page
            .document_mut()
            .push(Element::new("div").with_attr(ATTR_NOTIFY_FILE, target.as_str()));
        page.document_mut()
            .push(Element::new("div").with_attr(ATTR_NOTIFY_FILE, "http://127.0.0.1:8080/x"));
        let mut rx = page.subscribe();

        assert_eq!(page.notify_interested(&target), 1);
        assert_eq!(
            rx.try_recv().unwrap(),
            PageEvent::ElementSourceChange {
                element: id,
                target
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reload_is_recorded_and_published() {
        let mut page = page();
        let mut rx = page.subscribe();
        page.reload(ReloadKind::Hard);
        assert_eq!(page.reloads(), &[ReloadKind::Hard]);
        assert_eq!(rx.try_recv().unwrap(), PageEvent::Reload(ReloadKind::Hard));
    }

    #[test]
    fn test_send_broadcast_without_client() {
        assert!(!page().send_broadcast(Value::from("hi")));
    }

    #[test]
    fn test_send_broadcast_reaches_client() {
        let mut page = page();
        let (tx, mut rx) = mpsc::unbounded_channel();
        page.attach_client(tx);
        assert!(page.send_broadcast(Value::from("hi")));
        assert!(matches!(
            rx.try_recv().unwrap(),
            ClientMsg::SendBroadcast(v) if v == "hi"
        ));
    }
}
