//! Target identity type for change notifications.
//!
//! - Internal representation: absolute, parsed URL (canonical form)
//! - Logs: decoded path for readability

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

/// Query key appended to re-fetched resources.
pub const CACHE_BUST_KEY: &str = "cache_bust";

/// Canonical absolute reference to a changed resource.
///
/// Invariants:
/// - Always absolute (has scheme and host)
/// - Serialized form is the URL's canonical `href`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(Arc<Url>);

impl TargetId {
    /// Resolve a server-relative changed path against the page location.
    ///
    /// The dev server reports paths relative to its root (`styles/site.css`),
    /// so the target is always `origin + "/" + path`.
    pub fn resolve(location: &Url, path: &str) -> Result<Self, url::ParseError> {
        let rooted = format!("/{}", path.trim_start_matches('/'));
        location.join(&rooted).map(|url| Self::from_url(&url))
    }

    /// Parse an absolute URL string into its canonical form.
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Url::parse(href).map(|url| Self::from_url(&url))
    }

    pub fn from_url(url: &Url) -> Self {
        Self(Arc::new(url.clone()))
    }

    #[inline]
    pub fn url(&self) -> &Url {
        &self.0
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// URL path component (still percent-encoded).
    #[inline]
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Decoded path, for log output.
    pub fn decoded_path(&self) -> Cow<'_, str> {
        percent_encoding::percent_decode_str(self.0.path()).decode_utf8_lossy()
    }

    /// File extension used for hook lookup.
    ///
    /// Everything after the last `.` of the last path segment. A segment
    /// without a dot is returned whole, so `/Makefile` maps to `Makefile`.
    pub fn extension(&self) -> &str {
        let segment = self.0.path().rsplit('/').next().unwrap_or_default();
        segment.rsplit('.').next().unwrap_or_default()
    }

    /// Fresh URL for this target that bypasses any cached copy.
    pub fn cache_busted(&self) -> Url {
        let mut url = (*self.0).clone();
        url.set_query(Some(&format!("{CACHE_BUST_KEY}={}", cache_bust_stamp())));
        url
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Url> for TargetId {
    fn from(url: Url) -> Self {
        Self(Arc::new(url))
    }
}

/// Millisecond timestamp, strictly increasing across calls.
///
/// Two changes inside the same millisecond must still yield distinct URLs,
/// otherwise a module re-fetch would hit the previous load.
pub fn cache_bust_stamp() -> u64 {
    static LAST: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let mut prev = LAST.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// Strip query and fragment, keeping origin and path.
pub fn without_query(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url
}

// =============================================================================
// Tests
// =============================================================================
