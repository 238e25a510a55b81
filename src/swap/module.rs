//! Loaded module versions and their hot contract.
//!
//! A [`Module`] is one loaded version of a code file: its exports, plus for
//! hot-wrapped modules the exported setters map. Setters write into
//! [`Bindings`], the live export slots importers read through, so a swap
//! that calls a setter changes what every later lookup sees.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use url::Url;

use super::behavior::{Behavior, ReloadCallbacks};
use super::Instance;
use crate::core::TargetId;

/// Name of the default export.
pub const DEFAULT_EXPORT: &str = "default";

/// A module export.
#[derive(Debug, Clone)]
pub enum Export {
    /// Behavior-bearing export (instances can be constructed from it)
    Behavior(Arc<Behavior>),
    /// Plain value export
    Value(Value),
}

impl Export {
    pub fn behavior(&self) -> Option<&Arc<Behavior>> {
        match self {
            Self::Behavior(b) => Some(b),
            Self::Value(_) => None,
        }
    }
}

/// Rebinds one export slot.
pub type Setter = Arc<dyn Fn(Export) + Send + Sync>;

/// Exported setters map, keyed by export name.
#[derive(Clone, Default)]
pub struct Setters(FxHashMap<String, Setter>);

impl Setters {
    pub fn insert(&mut self, name: impl Into<String>, setter: Setter) {
        self.0.insert(name.into(), setter);
    }

    pub fn get(&self, name: &str) -> Option<&Setter> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Setters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.0.keys().collect();
        names.sort();
        f.debug_tuple("Setters").field(&names).finish()
    }
}

// =============================================================================
// Module
// =============================================================================

#[derive(Debug)]
pub struct Module {
    url: Url,
    /// Exports in declaration order
    exports: Vec<(String, Export)>,
    setters: Option<Setters>,
    /// File this module was hot-wrapped for
    hot_file: Option<TargetId>,
}

impl Module {
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn exports(&self) -> &[(String, Export)] {
        &self.exports
    }

    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports
            .iter()
            .find_map(|(n, e)| (n == name).then_some(e))
    }

    pub fn default_behavior(&self) -> Option<&Arc<Behavior>> {
        self.export(DEFAULT_EXPORT).and_then(Export::behavior)
    }

    pub fn setters(&self) -> Option<&Setters> {
        self.setters.as_ref()
    }

    pub fn hot_file(&self) -> Option<&TargetId> {
        self.hot_file.as_ref()
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// Live export slots of a hot module.
#[derive(Debug, Default)]
pub struct Bindings {
    slots: RwLock<FxHashMap<String, Export>>,
}

impl Bindings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Current value of an export slot.
    pub fn get(&self, name: &str) -> Option<Export> {
        self.slots.read().get(name).cloned()
    }

    /// Current dispatch table bound to `name`.
    pub fn behavior(&self, name: &str) -> Option<Arc<Behavior>> {
        self.slots.read().get(name)?.behavior().cloned()
    }

    /// Construct an instance from whatever table is bound to `name` now.
    pub fn construct(&self, name: &str, state: Value) -> Option<Arc<Instance>> {
        self.behavior(name).map(|b| b.construct(state))
    }

    fn seed(&self, name: &str, export: &Export) {
        self.slots
            .write()
            .entry(name.to_string())
            .or_insert_with(|| export.clone());
    }

    fn set(&self, name: &str, export: Export) {
        self.slots.write().insert(name.to_string(), export);
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds a [`Module`]; [`hot`](Self::hot) applies the hot wrapper.
pub struct ModuleBuilder {
    url: Url,
    exports: Vec<(String, Export)>,
    hot: Option<(Arc<Bindings>, TargetId)>,
}

impl ModuleBuilder {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            exports: Vec::new(),
            hot: None,
        }
    }

    pub fn behavior(self, name: impl Into<String>, behavior: Arc<Behavior>) -> Self {
        self.export(name, Export::Behavior(behavior))
    }

    pub fn value(self, name: impl Into<String>, value: Value) -> Self {
        self.export(name, Export::Value(value))
    }

    pub fn export(mut self, name: impl Into<String>, export: Export) -> Self {
        let name = name.into();
        self.exports.retain(|(n, _)| *n != name);
        self.exports.push((name, export));
        self
    }

    /// Hot-wrap the module: exports are bound into `bindings` and a setters
    /// map is attached, and `file` is recorded as a hot module.
    pub fn hot(mut self, bindings: Arc<Bindings>, file: TargetId) -> Self {
        self.hot = Some((bindings, file));
        self
    }

    pub fn build(self) -> Module {
        let Some((bindings, file)) = self.hot else {
            return Module {
                url: self.url,
                exports: self.exports,
                setters: None,
                hot_file: None,
            };
        };

        let mut setters = Setters::default();
        for (name, export) in &self.exports {
            bindings.seed(name, export);
            let slots = Arc::clone(&bindings);
            let slot = name.clone();
            setters.insert(name.clone(), Arc::new(move |e: Export| slots.set(&slot, e)));
        }

        if let Some((_, Export::Behavior(default))) =
            self.exports.iter().find(|(n, _)| n == DEFAULT_EXPORT)
        {
            default.set_on_reloaded(ReloadCallbacks::default());
            default.set_file(file.as_str());
        }

        Module {
            url: self.url,
            exports: self.exports,
            setters: Some(setters),
            hot_file: Some(file),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_plain_module() {
        let widget = Behavior::builder("Widget").build();
        let m = ModuleBuilder::new(url("http://h/w.js"))
            .behavior(DEFAULT_EXPORT, Arc::clone(&widget))
            .value("VERSION", Value::from(1))
            .build();

        assert!(m.setters().is_none());
        assert!(m.hot_file().is_none());
        assert!(Arc::ptr_eq(m.default_behavior().unwrap(), &widget));
        assert!(m.export("VERSION").unwrap().behavior().is_none());
        assert!(widget.on_reloaded().is_none());
    }

    #[test]
    fn test_hot_module_attaches_contract() {
        let bindings = Bindings::new();
        let file = TargetId::parse("http://h/w.js").unwrap();
        let widget = Behavior::builder("Widget").build();
        let m = ModuleBuilder::new(url("http://h/w.js"))
            .behavior(DEFAULT_EXPORT, Arc::clone(&widget))
            .value("VERSION", Value::from(1))
            .hot(Arc::clone(&bindings), file.clone())
            .build();

        let setters = m.setters().unwrap();
        assert_eq!(setters.len(), 2);
        assert_eq!(m.hot_file(), Some(&file));
        assert!(widget.on_reloaded().is_some());
        assert_eq!(widget.file().as_deref(), Some(file.as_str()));
        assert!(Arc::ptr_eq(&bindings.behavior(DEFAULT_EXPORT).unwrap(), &widget));
    }

    #[test]
    fn test_setter_rebinds_slot() {
        let bindings = Bindings::new();
        let file = TargetId::parse("http://h/w.js").unwrap();
        let v1 = Behavior::builder("Widget").build();
        let v2 = Behavior::builder("Widget").build();
        let m = ModuleBuilder::new(url("http://h/w.js"))
            .behavior(DEFAULT_EXPORT, Arc::clone(&v1))
            .hot(Arc::clone(&bindings), file)
            .build();

        let setter = m.setters().unwrap().get(DEFAULT_EXPORT).unwrap();
        setter(Export::Behavior(Arc::clone(&v2)));

        assert!(Arc::ptr_eq(&bindings.behavior(DEFAULT_EXPORT).unwrap(), &v2));
        let inst = bindings.construct(DEFAULT_EXPORT, Value::Null).unwrap();
        assert!(Arc::ptr_eq(&inst.behavior(), &v2));
    }

    #[test]
    fn test_rebuild_does_not_reseed_bindings() {
        let bindings = Bindings::new();
        let file = TargetId::parse("http://h/w.js").unwrap();
        let first = Behavior::builder("Widget").build();
        let second = Behavior::builder("Widget").build();

        for b in [&first, &second] {
            ModuleBuilder::new(url("http://h/w.js"))
                .behavior(DEFAULT_EXPORT, Arc::clone(b))
                .hot(Arc::clone(&bindings), file.clone())
                .build();
        }
        assert!(Arc::ptr_eq(&bindings.behavior(DEFAULT_EXPORT).unwrap(), &first));
    }
}
