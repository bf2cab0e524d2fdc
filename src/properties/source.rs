//! Read-only property source views.

use super::name::{indexed_key, is_descendant, normalize_key};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A read-only view over configuration input.
///
/// Keys handed to a source are already normalized (see [`normalize_key`]).
/// Implementations must never be mutated by the binder.
pub trait PropertySource: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Raw value stored at `key`, if any.
    fn lookup(&self, key: &str) -> Option<Value>;

    /// Ordered list stored at `key`.
    ///
    /// A native array at `key` wins; otherwise indexed keys `key[0]`,
    /// `key[1]`, ... are collected until the first gap.
    fn lookup_list(&self, key: &str) -> Option<Vec<Value>> {
        if let Some(Value::Array(items)) = self.lookup(key) {
            return Some(items);
        }
        let mut items = Vec::new();
        while let Some(item) = self.lookup(&indexed_key(key, items.len())) {
            items.push(item);
        }
        (!items.is_empty()).then_some(items)
    }

    /// Whether any key lies strictly below `prefix`.
    fn has_descendants(&self, prefix: &str) -> bool;

    /// The single layer a list at `key` is bound from, for layered sources.
    ///
    /// `None` means this source answers for the whole list itself. Lists are
    /// never merged across layers.
    fn list_layer(&self, _key: &str) -> Option<Arc<dyn PropertySource>> {
        None
    }

    fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }
}

/// An in-memory, ordered property source.
#[derive(Clone, Default)]
pub struct MapPropertySource {
    name: String,
    entries: BTreeMap<String, Value>,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add an entry, normalizing its key.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.entries.insert(normalize_key(key), value.into());
    }

    pub fn from_pairs<K, V, I>(name: impl Into<String>, pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut source = Self::new(name);
        for (key, value) in pairs {
            source.insert(key.as_ref(), value);
        }
        source
    }

    /// Build a source from a JSON document.
    ///
    /// Nested objects become dotted keys. Arrays of scalars stay native
    /// lists; arrays containing objects are flattened into indexed keys.
    pub fn from_json(name: impl Into<String>, document: &Value) -> Self {
        let mut source = Self::new(name);
        flatten("", document, &mut source.entries);
        source
    }

    /// Build a source from any serializable value (usually a struct of defaults).
    pub fn from_serializable<T: Serialize>(
        name: impl Into<String>,
        value: &T,
    ) -> serde_json::Result<Self> {
        let document = serde_json::to_value(value)?;
        Ok(Self::from_json(name, &document))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key = normalize_key(key);
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        Value::Array(items) if items.iter().any(Value::is_object) => {
            for (index, item) in items.iter().enumerate() {
                flatten(&indexed_key(prefix, index), item, out);
            }
        }
        _ if prefix.is_empty() => {}
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn has_descendants(&self, prefix: &str) -> bool {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .any(|(key, _)| is_descendant(prefix, key))
    }
}

impl fmt::Debug for MapPropertySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapPropertySource")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Property source backed by `--key=value` command-line options.
///
/// A bare `--flag` binds as the empty string; repeated options form a list.
#[derive(Debug, Clone)]
pub struct CommandLinePropertySource {
    inner: MapPropertySource,
}

impl CommandLinePropertySource {
    pub const NAME: &'static str = "commandLineArgs";

    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for arg in args {
            let Some(option) = arg.as_ref().strip_prefix("--") else {
                continue;
            };
            let (name, value) = match option.split_once('=') {
                Some((name, value)) => (name, value),
                None => (option, ""),
            };
            if name.is_empty() {
                continue;
            }
            options
                .entry(normalize_key(name))
                .or_default()
                .push(value.to_string());
        }

        let mut inner = MapPropertySource::new(Self::NAME);
        for (name, mut values) in options {
            let value = if values.len() == 1 {
                Value::String(values.remove(0))
            } else {
                Value::Array(values.into_iter().map(Value::String).collect())
            };
            inner.entries.insert(name, value);
        }
        Self { inner }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl PropertySource for CommandLinePropertySource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        self.inner.lookup(key)
    }

    fn has_descendants(&self, prefix: &str) -> bool {
        self.inner.has_descendants(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_normalized_on_insert() {
        let source = MapPropertySource::new("test").with("app.poolSize", 4);
        assert_eq!(source.lookup("app.pool-size"), Some(json!(4)));
    }

    #[test]
    fn lookup_list_prefers_native_arrays() {
        let source = MapPropertySource::new("test")
            .with("roles", json!(["A", "B"]))
            .with("roles[0]", "C");
        assert_eq!(source.lookup_list("roles"), Some(vec![json!("A"), json!("B")]));
    }

    #[test]
    fn lookup_list_collects_indexed_keys_until_gap() {
        let source = MapPropertySource::new("test")
            .with("roles[0]", "A")
            .with("roles[1]", "B")
            .with("roles[3]", "D");
        assert_eq!(source.lookup_list("roles"), Some(vec![json!("A"), json!("B")]));
        assert_eq!(source.lookup_list("missing"), None);
    }

    #[test]
    fn has_descendants_ignores_sibling_prefixes() {
        let source = MapPropertySource::new("test")
            .with("app.security-level", 1)
            .with("app.security.username", "alice");
        assert!(source.has_descendants("app.security"));
        assert!(source.has_descendants("app"));
        assert!(!source.has_descendants("app.security.username"));

        let sibling_only = MapPropertySource::new("test").with("app.security-level", 1);
        assert!(!sibling_only.has_descendants("app.security"));
    }

    #[test]
    fn from_json_flattens_objects() {
        let source = MapPropertySource::from_json(
            "json",
            &json!({
                "spring": { "boot": { "service": {
                    "enable": true,
                    "security": { "userName": "alice", "roles": ["ADMIN"] },
                    "endpoints": [{ "path": "/a" }, { "path": "/b" }]
                }}}
            }),
        );
        assert_eq!(source.lookup("spring.boot.service.enable"), Some(json!(true)));
        assert_eq!(
            source.lookup("spring.boot.service.security.user-name"),
            Some(json!("alice"))
        );
        assert_eq!(
            source.lookup("spring.boot.service.security.roles"),
            Some(json!(["ADMIN"]))
        );
        assert_eq!(
            source.lookup("spring.boot.service.endpoints[1].path"),
            Some(json!("/b"))
        );
    }

    #[test]
    fn command_line_options() {
        let source = CommandLinePropertySource::new([
            "--server.port=8080",
            "--debug",
            "positional",
            "--tag=a",
            "--tag=b",
        ]);
        assert_eq!(source.lookup("server.port"), Some(json!("8080")));
        assert_eq!(source.lookup("debug"), Some(json!("")));
        assert_eq!(source.lookup("tag"), Some(json!(["a", "b"])));
        assert!(!source.contains("positional"));
    }
}
