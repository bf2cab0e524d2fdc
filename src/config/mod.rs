use crate::properties::{PropertySource, normalize_key};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Precedence-ordered property sources
///
/// The first source that has a key wins. Clones share the same source list.
#[derive(Clone, Default)]
pub struct Environment {
    sources: Arc<RwLock<Vec<Arc<dyn PropertySource>>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source with the highest precedence.
    pub fn add_first(&self, source: Arc<dyn PropertySource>) {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, source);
    }

    /// Add a source with the lowest precedence.
    pub fn add_last(&self, source: Arc<dyn PropertySource>) {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(source);
    }

    pub fn get_property(&self, key: &str) -> Option<Value> {
        self.lookup(&normalize_key(key))
    }

    /// Property rendered as text. Strings are returned without quotes.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_property(key).map(|value| match value {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }

    pub fn property_source_names(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|source| source.name().to_string())
            .collect()
    }

    fn snapshot(&self) -> Vec<Arc<dyn PropertySource>> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PropertySource for Environment {
    fn name(&self) -> &str {
        "environment"
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        self.snapshot().iter().find_map(|source| source.lookup(key))
    }

    fn lookup_list(&self, key: &str) -> Option<Vec<Value>> {
        self.list_layer(key)?.lookup_list(key)
    }

    fn has_descendants(&self, prefix: &str) -> bool {
        self.snapshot()
            .iter()
            .any(|source| source.has_descendants(prefix))
    }

    /// First source holding `key` itself, `key[i]` items or `key.` members.
    fn list_layer(&self, key: &str) -> Option<Arc<dyn PropertySource>> {
        self.snapshot()
            .into_iter()
            .find(|source| source.contains(key) || source.has_descendants(key))
            .map(|source| source.list_layer(key).unwrap_or(source))
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("sources", &self.property_source_names())
            .finish()
    }
}
