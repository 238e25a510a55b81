//! Inbound frame dispatch.
//!
//! Change handling pipeline, strictly one change at a time:
//!
//! ```text
//! path -> TargetId -> pre-notification --vetoed--> stop
//!                          |
//!                     handler (cached) --handled--------------+
//!                          |      \--reloaded--> stop         |
//!                          | not handled / failed              |
//!                     patch_links --matched-------------------+--> notify elements
//!                          | nothing matched
//!                     hard reload
//! ```

use crate::channel::InboundMessage;
use crate::core::TargetId;
use crate::hooks::{HandlerContext, Handling, patch_links};
use crate::page::{PageEvent, ReloadKind, dispatch_source_change};
use crate::{debug, log};

use super::LiveClient;

/// How a change notification was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Path did not resolve against the page location
    Invalid,
    /// An observer canceled the pre-notification
    Vetoed,
    /// The target's handler took care of it
    Handled,
    /// Matching `link` elements were re-pointed
    DomPatched,
    /// The page reloaded, from the handler or as the last resort
    Reloaded,
}

impl ChangeOutcome {
    /// Whether interested elements get told about the change.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Handled | Self::DomPatched)
    }
}

impl LiveClient {
    /// Route one inbound frame. Malformed frames are logged and dropped.
    pub async fn handle_frame(&mut self, text: &str) {
        match InboundMessage::parse(text) {
            Ok(InboundMessage::Change(path)) => {
                self.handle_change(&path).await;
            }
            Ok(InboundMessage::Stdin(line)) => self.page.lock().emit(PageEvent::Stdin(line)),
            Ok(InboundMessage::Broadcast(message)) => {
                self.page.lock().emit(PageEvent::Broadcast(message))
            }
            Err(e) => log!("channel"; "dropping frame: {}", e),
        }
    }

    /// Handle a change of the server-relative `path`.
    pub async fn handle_change(&mut self, path: &str) -> ChangeOutcome {
        let location = self.page.lock().location().clone();
        let target = match TargetId::resolve(&location, path) {
            Ok(target) => target,
            Err(e) => {
                log!("error"; "bad change path `{}`: {}", path, e);
                return ChangeOutcome::Invalid;
            }
        };

        if !dispatch_source_change(&self.page, &target) {
            return ChangeOutcome::Vetoed;
        }

        let new_target = target.cache_busted();
        let cx = HandlerContext {
            page: &self.page,
            swap: &self.swap,
        };
        let handling = match self.handlers.get_or_create(&target, &self.hooks) {
            Some(handler) => match handler.handle(&cx, &new_target).await {
                Ok(handling) => handling,
                Err(e) => {
                    log!("error"; "handler for {} failed: {}", target.decoded_path(), e);
                    Handling::Unhandled
                }
            },
            None => Handling::Unhandled,
        };

        let outcome = match handling {
            Handling::Handled => ChangeOutcome::Handled,
            Handling::Reloaded => ChangeOutcome::Reloaded,
            Handling::Unhandled if patch_links(&mut self.page.lock(), &target, &new_target) => {
                ChangeOutcome::DomPatched
            }
            Handling::Unhandled => {
                self.page.lock().reload(ReloadKind::Hard);
                ChangeOutcome::Reloaded
            }
        };

        log!("change"; "{} ({:?})", target.decoded_path(), outcome);
        if outcome.is_success() {
            let notified = self.page.lock().notify_interested(&target);
            if notified > 0 {
                debug!("change"; "notified {} element(s)", notified);
            }
        }
        outcome
    }
}
