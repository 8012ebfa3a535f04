//! Resolvers keyed by their data topic.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::{ResolverError, ResolverResult};
use crate::ports::Resolver;

/// Thread-safe map from topic to resolver.
#[derive(Default)]
pub struct ResolversContainer {
    resolvers: RwLock<HashMap<String, Arc<dyn Resolver>>>,
}

impl ResolversContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver stored under `key`.
    pub fn get(&self, key: &str) -> ResolverResult<Arc<dyn Resolver>> {
        self.resolvers
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ResolverError::InvalidContainerKey(key.to_string()))
    }

    /// Store a resolver under a new key.
    pub fn add(&self, key: &str, resolver: Arc<dyn Resolver>) -> ResolverResult<()> {
        let mut resolvers = self.resolvers.write();
        if resolvers.contains_key(key) {
            return Err(ResolverError::ContainerKeyAlreadyExists(key.to_string()));
        }
        resolvers.insert(key.to_string(), resolver);
        Ok(())
    }

    /// Store several resolvers, stopping at the first duplicate key.
    pub fn add_multiple(&self, keys: &[String], resolvers: Vec<Arc<dyn Resolver>>) -> ResolverResult<()> {
        if keys.len() != resolvers.len() {
            return Err(ResolverError::LenMismatch {
                keys: keys.len(),
                values: resolvers.len(),
            });
        }
        for (key, resolver) in keys.iter().zip(resolvers) {
            self.add(key, resolver)?;
        }
        Ok(())
    }

    /// Store a resolver, overwriting any previous one.
    pub fn replace(&self, key: &str, resolver: Arc<dyn Resolver>) {
        self.resolvers.write().insert(key.to_string(), resolver);
    }

    /// Drop the resolver under `key`.
    pub fn remove(&self, key: &str) {
        self.resolvers.write().remove(key);
    }

    /// Number of stored resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.resolvers.read().is_empty()
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.resolvers.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}
