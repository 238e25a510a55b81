//! Ignore Filter
//!
//! Suppresses change notifications for paths listed in `/.reserveignore`.
//!
//! - A pattern only takes effect when it starts with `/`
//! - A path is ignored iff an effective pattern is a literal prefix of it
//! - Every reload replaces the whole set (no merge with the previous one)
//!
//! The filter hooks in as a source-change observer, so ignored changes are
//! vetoed before any handler runs. A change to the ignore file itself triggers
//! a reload and is vetoed too.

use std::sync::Arc;

use arc_swap::ArcSwap;
use url::Url;

use crate::net::ResourceFetcher;
use crate::page::{SourceChangeEvent, SourceChangeObserver};

/// Default location of the ignore resource.
pub const IGNORE_RESOURCE: &str = "/.reserveignore";

pub struct IgnoreFilter {
    /// Current pattern set, swapped atomically on reload
    patterns: ArcSwap<Vec<String>>,
    /// Absolute URL of the ignore resource
    resource: Url,
    fetcher: Arc<dyn ResourceFetcher>,
}

impl IgnoreFilter {
    pub fn new(resource: Url, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            patterns: ArcSwap::from_pointee(Vec::new()),
            resource,
            fetcher,
        }
    }

    /// URL path of the ignore resource (the special-cased change target).
    pub fn resource_path(&self) -> &str {
        self.resource.path()
    }

    /// Snapshot of the current pattern set.
    pub fn patterns(&self) -> Arc<Vec<String>> {
        self.patterns.load_full()
    }

    /// Check a URL path against the current pattern set.
    pub fn should_ignore(&self, path: &str) -> bool {
        self.patterns
            .load()
            .iter()
            .any(|pat| pat.starts_with('/') && path.starts_with(pat.as_str()))
    }

    /// Replace the pattern set from ignore-file text.
    pub fn replace(&self, text: &str) {
        let patterns = parse_patterns(text);
        crate::debug!("ignore"; "{} pattern(s) loaded", patterns.len());
        self.patterns.store(Arc::new(patterns));
    }

    /// Re-fetch the ignore resource.
    ///
    /// On failure the previous set stays in place. Returns whether the set
    /// was replaced.
    pub async fn reload(&self) -> bool {
        match self.fetcher.fetch_text(&self.resource).await {
            Ok(text) => {
                self.replace(&text);
                true
            }
            Err(e) => {
                crate::debug!("ignore"; "keeping previous patterns: {}", e);
                false
            }
        }
    }

    /// Reload in the background (requires a running tokio runtime).
    pub fn spawn_reload(self: &Arc<Self>) {
        let filter = Arc::clone(self);
        tokio::spawn(async move {
            filter.reload().await;
        });
    }
}

/// One pattern per line; blank lines skipped, CRLF tolerated.
fn parse_patterns(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Source-change observer wiring the filter into the page.
pub struct IgnoreObserver(pub Arc<IgnoreFilter>);

impl SourceChangeObserver for IgnoreObserver {
    fn on_source_change(&self, event: &mut SourceChangeEvent) {
        let path = event.target().path();
        if path == self.0.resource_path() {
            crate::debug!("ignore"; "ignore file changed, reloading patterns");
            self.0.spawn_reload();
            event.prevent_default();
        } else if self.0.should_ignore(path) {
            crate::debug!("ignore"; "ignored: {}", event.target().decoded_path());
            event.prevent_default();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
