//! Backend registry keyed by stable identifier

use super::traits::Backend;
use super::{aquabrowser::Aquabrowser, summon::Summon};
use std::sync::Arc;

/// Registry of available search backends, in registration order
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn Backend>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Registry holding every built-in backend
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Aquabrowser::new()));
        registry.register(Arc::new(Summon::new()));
        registry
    }

    /// Register a backend. A backend with the same identifier is replaced in place.
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        match self
            .backends
            .iter_mut()
            .find(|existing| existing.name() == backend.name())
        {
            Some(existing) => *existing = backend,
            None => self.backends.push(backend),
        }
    }

    /// Get a backend by identifier
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Backend>> {
        self.backends.iter().find(|b| b.name() == name)
    }

    /// All backends in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Backend>> {
        self.backends.iter()
    }

    /// Get all backend identifiers
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Get number of registered backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
