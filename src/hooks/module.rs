//! `js` hook: hot module swap.
//!
//! Each changed code file gets one `ModuleHandler`. It remembers the URL of
//! the last version it swapped in, so every swap migrates from exactly the
//! version the live instances were last pointed at. A swap that forced a
//! reload leaves that URL where it was.

use async_trait::async_trait;
use url::Url;

use super::{HandlerContext, HandlerError, Handling, TargetHandler};
use crate::core::TargetId;
use crate::page::ReloadKind;
use crate::swap::RAW_KEY;

pub struct ModuleHandler {
    target: TargetId,
    /// Previous version, starts as the original import
    last: Url,
}

impl ModuleHandler {
    pub fn new(target: &TargetId) -> Self {
        Self {
            target: target.clone(),
            last: target.url().clone(),
        }
    }

    pub fn last(&self) -> &Url {
        &self.last
    }
}

#[async_trait]
impl TargetHandler for ModuleHandler {
    async fn handle(
        &mut self,
        cx: &HandlerContext<'_>,
        new_target: &Url,
    ) -> Result<Handling, HandlerError> {
        if !cx.swap.modules().is_hot(&self.target) {
            return Ok(Handling::Unhandled);
        }

        let mut next = new_target.clone();
        next.query_pairs_mut().append_key_only(RAW_KEY);

        let versions = match cx.swap.load(self.target.url(), &self.last, &next).await {
            Ok(versions) => versions,
            Err(e) if e.forces_reload() => {
                crate::log!("error"; "{}: {}, reloading", self.target.decoded_path(), e);
                cx.page.lock().reload(ReloadKind::Hard);
                return Ok(Handling::Reloaded);
            }
            Err(e) => return Err(e.into()),
        };

        match cx.swap.apply(&versions) {
            Ok(_) => {
                crate::log!("swap"; "{}", self.target.decoded_path());
                self.last = next;
                Ok(Handling::Handled)
            }
            Err(e) => {
                crate::log!("error"; "{}: {}, reloading", self.target.decoded_path(), e);
                cx.page.lock().reload(ReloadKind::Hard);
                Ok(Handling::Reloaded)
            }
        }
    }
}
