//! Module loading with per-URL memoization.
//!
//! Like a module map, one URL yields one module identity for the page's
//! lifetime: the first load of a URL is kept and every later load of the same
//! URL returns it. Cache-busted URLs are distinct keys, which is how a swap
//! obtains a fresh version.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use url::Url;

use super::module::Module;
use super::LoadError;
use crate::core::TargetId;

/// Query key asking for the unwrapped module source.
pub const RAW_KEY: &str = "raw";

/// Where module versions come from.
#[async_trait]
pub trait ModuleSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Module, LoadError>;
}

/// Source that knows no modules.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoModules;

#[async_trait]
impl ModuleSource for NoModules {
    async fn fetch(&self, url: &Url) -> Result<Module, LoadError> {
        Err(LoadError::NotFound { url: url.clone() })
    }
}

pub struct ModuleCache {
    source: Arc<dyn ModuleSource>,
    loaded: Mutex<FxHashMap<Url, Arc<Module>>>,
    /// Files whose loaded module exposed a setters map
    hot: RwLock<FxHashSet<TargetId>>,
}

impl ModuleCache {
    pub fn new(source: Arc<dyn ModuleSource>) -> Self {
        Self {
            source,
            loaded: Mutex::new(FxHashMap::default()),
            hot: RwLock::new(FxHashSet::default()),
        }
    }

    /// Load `url`, returning the memoized module if it was loaded before.
    pub async fn load(&self, url: &Url) -> Result<Arc<Module>, LoadError> {
        if let Some(module) = self.cached(url) {
            return Ok(module);
        }

        let module = Arc::new(self.source.fetch(url).await?);

        // A concurrent load of the same URL may have finished first
        let module = Arc::clone(
            self.loaded
                .lock()
                .entry(url.clone())
                .or_insert(module),
        );

        if let Some(file) = module.hot_file()
            && module.setters().is_some()
        {
            self.hot.write().insert(file.clone());
        }
        crate::debug!("swap"; "loaded {}", url);
        Ok(module)
    }

    pub fn cached(&self, url: &Url) -> Option<Arc<Module>> {
        self.loaded.lock().get(url).cloned()
    }

    /// Whether a loaded module recorded `file` as hot.
    pub fn is_hot(&self, file: &TargetId) -> bool {
        self.hot.read().contains(file)
    }

    pub fn len(&self) -> usize {
        self.loaded.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.lock().is_empty()
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::new(Arc::new(NoModules))
    }
}

impl std::fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCache")
            .field("loaded", &self.len())
            .field("hot", &self.hot.read().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swap::behavior::Behavior;
    use crate::swap::module::{Bindings, DEFAULT_EXPORT, ModuleBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Builds a fresh hot module per fetch and counts fetches.
    struct CountingSource {
        fetches: AtomicUsize,
        bindings: Arc<Bindings>,
    }

    #[async_trait]
    impl ModuleSource for CountingSource {
        async fn fetch(&self, url: &Url) -> Result<Module, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let file = TargetId::from_url(&crate::core::without_query(url));
            Ok(ModuleBuilder::new(url.clone())
                .behavior(DEFAULT_EXPORT, Behavior::builder("W").build())
                .hot(Arc::clone(&self.bindings), file)
                .build())
        }
    }

    fn cache() -> (ModuleCache, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            fetches: AtomicUsize::new(0),
            bindings: Bindings::new(),
        });
        (ModuleCache::new(source.clone()), source)
    }

    #[tokio::test]
    async fn test_load_is_memoized_per_url() {
        let (cache, source) = cache();
        let a = Url::parse("http://h/w.js").unwrap();
        let b = Url::parse("http://h/w.js?cache_bust=1&raw").unwrap();

        let first = cache.load(&a).await.unwrap();
        let again = cache.load(&a).await.unwrap();
        let fresh = cache.load(&b).await.unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &fresh));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_hot_set_recorded() {
        let (cache, _) = cache();
        let file = TargetId::parse("http://h/w.js").unwrap();
        assert!(!cache.is_hot(&file));

        cache.load(file.url()).await.unwrap();
        assert!(cache.is_hot(&file));
        assert!(!cache.is_hot(&TargetId::parse("http://h/other.js").unwrap()));
    }

    #[tokio::test]
    async fn test_no_modules() {
        let cache = ModuleCache::default();
        let url = Url::parse("http://h/w.js").unwrap();
        assert!(matches!(
            cache.load(&url).await,
            Err(LoadError::NotFound { .. })
        ));
        assert!(cache.is_empty());
    }
}
