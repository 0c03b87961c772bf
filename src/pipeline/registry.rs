//! Registry of config handlers, indexed by option key.
//!
//! Handlers are registered as factories on a [`HandlerRegistryBuilder`];
//! [`HandlerRegistryBuilder::build`] instantiates each factory exactly once
//! and rejects duplicate keys. The resulting [`HandlerRegistry`] is
//! read-only and is meant to be built once and shared (usually behind an
//! `Arc`) by every pipeline build.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use rapid_featurize::pipeline::registry::HandlerRegistry;
//!
//! let registry = HandlerRegistry::builder()
//!     .register_all(rapid_featurize::pipeline::handlers::default_factories())
//!     .register(|| Ok(Box::new(MyHandler)))
//!     .build()?;
//! ```

use rustc_hash::FxHashMap;

use super::errors::ConfigError;
use super::handlers;
use super::traits::ConfigHandler;

/// Constructor for a handler. Errors are reported as
/// `handler_instantiation_failed`.
pub type HandlerFactory = fn() -> Result<Box<dyn ConfigHandler>, String>;

// ─── Builder ────────────────────────────────────────────────────────────────

/// Collects handler factories before the registry is frozen.
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    factories: Vec<HandlerFactory>,
}

impl HandlerRegistryBuilder {
    /// Create a builder with no factories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one handler factory.
    pub fn register(mut self, factory: HandlerFactory) -> Self {
        self.factories.push(factory);
        self
    }

    /// Register several handler factories.
    pub fn register_all(mut self, factories: impl IntoIterator<Item = HandlerFactory>) -> Self {
        self.factories.extend(factories);
        self
    }

    /// Instantiate every factory and index the handlers by key.
    ///
    /// Fails on the first factory error or the first duplicate key.
    pub fn build(self) -> Result<HandlerRegistry, ConfigError> {
        let mut handlers: FxHashMap<String, Box<dyn ConfigHandler>> =
            FxHashMap::with_capacity_and_hasher(self.factories.len(), Default::default());

        for factory in self.factories {
            let handler = factory().map_err(ConfigError::instantiation_failed)?;
            let key = handler.key().to_string();
            if handlers.contains_key(&key) {
                return Err(ConfigError::duplicate_key(&key));
            }
            handlers.insert(key, handler);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(handlers = handlers.len(), "built config handler registry");

        Ok(HandlerRegistry { handlers })
    }
}

// ─── Registry ───────────────────────────────────────────────────────────────

/// Immutable mapping from option key to handler.
pub struct HandlerRegistry {
    handlers: FxHashMap<String, Box<dyn ConfigHandler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl HandlerRegistry {
    /// Start registering handlers.
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new()
    }

    /// Registry holding every built-in handler.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::builder()
            .register_all(handlers::default_factories())
            .build()
    }

    /// Look up the handler for `key`.
    pub fn get(&self, key: &str) -> Option<&dyn ConfigHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Whether a handler exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// All known keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// `(key, description)` pairs, sorted by key.
    pub fn describe(&self) -> Vec<(&str, &str)> {
        self.keys()
            .into_iter()
            .filter_map(|k| self.handlers.get(k).map(|h| (k, h.description())))
            .collect()
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
