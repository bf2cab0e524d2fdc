//! Property-to-member binding.
//!
//! Two entry points mirror the two strategies: [`ConfigBinder::bind`] mutates
//! an already constructed instance, [`ConfigBinder::bind_or_create`] binds
//! constructor arguments first and builds a fresh instance from them. Both
//! recurse into nested configuration objects, resolving a strategy for each.

use super::descriptor::{DefaultValue, Introspect, ParameterDescriptor, TypeDescriptor, ValueKind};
use super::name::{child_key, indexed_key, normalize_key};
use super::source::PropertySource;
use super::strategy::{BindStrategy, BindStrategyResolver};
use super::value::{AnyValue, Arguments, BoundValue, ConversionError};
use crate::error::{IgnitionError, Result};
use serde_json::Value;
use std::any::{Any, type_name};

#[derive(Debug, Clone, Default)]
pub struct ConfigBinder {
    resolver: BindStrategyResolver,
}

impl ConfigBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(resolver: BindStrategyResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &BindStrategyResolver {
        &self.resolver
    }

    /// Bind values under `prefix` onto an existing instance described by `ty`.
    ///
    /// Members without a source value keep whatever they currently hold.
    pub fn bind(
        &self,
        target: &mut dyn Any,
        ty: &TypeDescriptor,
        source: &dyn PropertySource,
        prefix: &str,
    ) -> Result<()> {
        let prefix = normalize_key(prefix);
        tracing::debug!(type_name = ty.type_name(), %prefix, "binding onto existing instance");
        self.bind_properties(target, ty, source, &prefix)
            .map_err(|e| IgnitionError::configuration_bind(ty.type_name(), &prefix, e))
    }

    /// Create a new instance of `ty` with values bound under `prefix`.
    pub fn bind_or_create(
        &self,
        ty: &TypeDescriptor,
        source: &dyn PropertySource,
        prefix: &str,
    ) -> Result<AnyValue> {
        let prefix = normalize_key(prefix);
        tracing::debug!(type_name = ty.type_name(), %prefix, "binding into a new instance");
        self.create_object(ty, source, &prefix, false)
            .map_err(|e| IgnitionError::configuration_bind(ty.type_name(), &prefix, e))
    }

    /// Typed form of [`ConfigBinder::bind`].
    pub fn bind_instance<T: Introspect>(
        &self,
        target: &mut T,
        source: &dyn PropertySource,
        prefix: &str,
    ) -> Result<()> {
        self.bind(target, &T::type_descriptor(), source, prefix)
    }

    /// Typed form of [`ConfigBinder::bind_or_create`].
    pub fn create<T: Introspect>(&self, source: &dyn PropertySource, prefix: &str) -> Result<T> {
        self.bind_or_create(&T::type_descriptor(), source, prefix)?
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| IgnitionError::DowncastFailed {
                type_name: type_name::<T>().to_string(),
            })
    }

    fn create_object(
        &self,
        ty: &TypeDescriptor,
        source: &dyn PropertySource,
        prefix: &str,
        nested: bool,
    ) -> Result<AnyValue> {
        match self.resolver.bind_constructor(ty, nested)? {
            Some(constructor) => {
                let values = constructor
                    .parameters()
                    .iter()
                    .map(|parameter| {
                        let key = child_key(prefix, parameter.name());
                        self.bind_argument(parameter, source, &key)
                            .map(|value| (key, value))
                    })
                    .collect::<Result<Vec<_>>>()?;
                constructor.invoke(Arguments::new(ty.type_name(), values))
            }
            None => {
                let constructor = ty.default_constructor().ok_or_else(|| {
                    IgnitionError::no_bind_strategy(
                        ty.type_name(),
                        "no bind constructor and no zero-argument constructor",
                    )
                })?;
                let mut instance = constructor.invoke(Arguments::empty(ty.type_name()))?;
                self.bind_properties(instance.as_mut(), ty, source, prefix)?;
                Ok(instance)
            }
        }
    }

    fn create_nested(
        &self,
        ty: &TypeDescriptor,
        source: &dyn PropertySource,
        prefix: &str,
    ) -> Result<AnyValue> {
        self.create_object(ty, source, prefix, true)
    }

    fn bind_properties(
        &self,
        target: &mut dyn Any,
        ty: &TypeDescriptor,
        source: &dyn PropertySource,
        prefix: &str,
    ) -> Result<()> {
        for property in ty.properties() {
            let key = child_key(prefix, property.name());
            if let ValueKind::Nested(nested) = property.kind() {
                let nested = nested();
                if self.resolver.resolve_nested(&nested)? == BindStrategy::Property {
                    if let Some(existing) = property.nested_mut(target) {
                        self.bind_properties(existing, &nested, source, &key)?;
                        continue;
                    }
                }
                if source.contains(&key) || source.has_descendants(&key) {
                    let value = self.create_nested(&nested, source, &key)?;
                    property
                        .set(target, BoundValue::Object(value))
                        .map_err(|e| conversion(&key, property.kind(), e))?;
                }
                continue;
            }

            if let Some(value) = self.bind_value(property.kind(), source, &key, None)? {
                tracing::trace!(%key, "setting property");
                property
                    .set(target, value)
                    .map_err(|e| conversion(&key, property.kind(), e))?;
            }
        }
        Ok(())
    }

    fn bind_argument(
        &self,
        parameter: &ParameterDescriptor,
        source: &dyn PropertySource,
        key: &str,
    ) -> Result<BoundValue> {
        match parameter.kind() {
            // never hand an absent value to a nested constructor argument
            ValueKind::Nested(nested) => Ok(BoundValue::Object(self.create_nested(
                &nested(),
                source,
                key,
            )?)),
            kind => Ok(self
                .bind_value(kind, source, key, parameter.default_value())?
                .unwrap_or(BoundValue::Absent)),
        }
    }

    /// Value for `key`, or `None` when neither the source nor a default has one.
    fn bind_value(
        &self,
        kind: &ValueKind,
        source: &dyn PropertySource,
        key: &str,
        default: Option<&DefaultValue>,
    ) -> Result<Option<BoundValue>> {
        match kind {
            ValueKind::List(element) => self.bind_list(element, source, key, default),
            ValueKind::Optional(inner) => self.bind_value(inner, source, key, default),
            ValueKind::Nested(nested) => {
                if source.contains(key) || source.has_descendants(key) || default.is_some() {
                    let value = self.create_nested(&nested(), source, key)?;
                    Ok(Some(BoundValue::Object(value)))
                } else {
                    Ok(None)
                }
            }
            scalar => {
                let raw = match source.lookup(key) {
                    Some(value) if !value.is_null() => value,
                    _ => match default {
                        Some(DefaultValue::Literal(text)) => Value::String(text.clone()),
                        _ => return Ok(None),
                    },
                };
                coerce(scalar, &raw)
                    .map(Some)
                    .map_err(|e| conversion(key, scalar, e))
            }
        }
    }

    fn bind_list(
        &self,
        element: &ValueKind,
        source: &dyn PropertySource,
        key: &str,
        default: Option<&DefaultValue>,
    ) -> Result<Option<BoundValue>> {
        let layer = source.list_layer(key);
        let source: &dyn PropertySource = match &layer {
            Some(layer) => layer.as_ref(),
            None => source,
        };

        if let ValueKind::Nested(nested) = element {
            let nested = nested();
            let mut items = Vec::new();
            loop {
                let item_key = indexed_key(key, items.len());
                if !source.has_descendants(&item_key) {
                    break;
                }
                items.push(BoundValue::Object(
                    self.create_nested(&nested, source, &item_key)?,
                ));
            }
            if items.is_empty() && default.is_none() {
                return Ok(None);
            }
            return Ok(Some(BoundValue::List(items)));
        }

        let raw_items = match source.lookup_list(key) {
            Some(items) => items,
            None => match source.lookup(key) {
                Some(Value::String(text)) => split_delimited(&text),
                Some(Value::Null) | None => match default {
                    Some(DefaultValue::Literal(text)) => split_delimited(text),
                    Some(DefaultValue::Empty) => Vec::new(),
                    None => return Ok(None),
                },
                Some(other) => vec![other],
            },
        };

        raw_items
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                coerce(element, raw).map_err(|e| conversion(&indexed_key(key, index), element, e))
            })
            .collect::<Result<Vec<_>>>()
            .map(|items| Some(BoundValue::List(items)))
    }
}

fn conversion(key: &str, kind: &ValueKind, source: ConversionError) -> IgnitionError {
    IgnitionError::BindConversion {
        key: key.to_string(),
        target: format!("{kind:?}"),
        source,
    }
}

fn split_delimited(text: &str) -> Vec<Value> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',')
        .map(|item| Value::String(item.trim().to_string()))
        .collect()
}

fn describe_raw(raw: &Value) -> String {
    match raw {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("'{s}'"),
        Value::Array(_) => "list".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

fn mismatch(expected: &'static str, raw: &Value) -> ConversionError {
    ConversionError::Mismatch {
        expected,
        found: describe_raw(raw),
    }
}

/// Coerce a raw source value into the scalar shape `kind`.
fn coerce(kind: &ValueKind, raw: &Value) -> std::result::Result<BoundValue, ConversionError> {
    match kind {
        ValueKind::Bool => match raw {
            Value::Bool(b) => Ok(BoundValue::Bool(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(BoundValue::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(BoundValue::Bool(false)),
                _ => Err(mismatch("boolean", raw)),
            },
            Value::Number(n) => match n.as_i64() {
                Some(1) => Ok(BoundValue::Bool(true)),
                Some(0) => Ok(BoundValue::Bool(false)),
                _ => Err(mismatch("boolean", raw)),
            },
            _ => Err(mismatch("boolean", raw)),
        },
        ValueKind::Integer => match raw {
            Value::Number(n) => match n.as_i64() {
                Some(v) => Ok(BoundValue::Integer(v)),
                None if n.is_u64() => Err(ConversionError::OutOfRange {
                    value: n.to_string(),
                    target: "i64",
                }),
                None => Err(mismatch("integer", raw)),
            },
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(BoundValue::Integer)
                .map_err(|_| mismatch("integer", raw)),
            _ => Err(mismatch("integer", raw)),
        },
        ValueKind::Float => match raw {
            Value::Number(n) => n
                .as_f64()
                .map(BoundValue::Float)
                .ok_or_else(|| mismatch("float", raw)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(BoundValue::Float)
                .map_err(|_| mismatch("float", raw)),
            _ => Err(mismatch("float", raw)),
        },
        ValueKind::Text => match raw {
            Value::String(s) => Ok(BoundValue::Text(s.clone())),
            Value::Bool(b) => Ok(BoundValue::Text(b.to_string())),
            Value::Number(n) => Ok(BoundValue::Text(n.to_string())),
            Value::Array(items) if items.iter().all(|item| !item.is_object()) => {
                let parts = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>();
                Ok(BoundValue::Text(parts.join(",")))
            }
            _ => Err(mismatch("string", raw)),
        },
        ValueKind::Enum(variants) => {
            let text = match raw {
                Value::String(s) => s.trim().to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                _ => return Err(mismatch("enum", raw)),
            };
            let wanted = canonical_variant(&text);
            variants
                .iter()
                .find(|variant| canonical_variant(variant) == wanted)
                .map(|variant| BoundValue::Text((*variant).to_string()))
                .ok_or_else(|| ConversionError::UnknownVariant {
                    value: text,
                    expected: variants.iter().map(|v| v.to_string()).collect(),
                })
        }
        other => Err(mismatch(other.describe(), raw)),
    }
}

fn canonical_variant(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{
        Bindable, ConstructorDescriptor, MapPropertySource, ParameterDescriptor,
        PropertyDescriptor,
    };
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Pool {
        size: u32,
        name: String,
        tags: Vec<String>,
    }

    impl Introspect for Pool {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Self>()
                .with_constructor(ConstructorDescriptor::default_of::<Self>())
                .with_property(PropertyDescriptor::field::<Self, u32>("size", |p| &mut p.size))
                .with_property(PropertyDescriptor::field::<Self, String>("name", |p| {
                    &mut p.name
                }))
                .with_property(PropertyDescriptor::field::<Self, Vec<String>>("tags", |p| {
                    &mut p.tags
                }))
        }
    }

    impl Bindable for Pool {
        fn value_kind() -> ValueKind {
            ValueKind::Nested(Self::type_descriptor)
        }

        fn from_bound(value: BoundValue) -> std::result::Result<Self, ConversionError> {
            value.into_object()
        }

        fn nested_mut(&mut self) -> Option<&mut dyn Any> {
            Some(self as &mut dyn Any)
        }
    }

    #[derive(Debug, PartialEq)]
    struct Endpoint {
        url: String,
        timeout: u64,
        pool: Pool,
    }

    impl Introspect for Endpoint {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Self>()
                .constructor_binding()
                .with_constructor(ConstructorDescriptor::new(
                    vec![
                        ParameterDescriptor::of::<String>("url"),
                        ParameterDescriptor::of::<u64>("timeout")
                            .with_default(DefaultValue::Literal("30".to_string())),
                        ParameterDescriptor::of::<Pool>("pool").with_default(DefaultValue::Empty),
                    ],
                    |args| {
                        Ok(Box::new(Endpoint {
                            url: args.take()?,
                            timeout: args.take()?,
                            pool: args.take()?,
                        }) as AnyValue)
                    },
                ))
        }
    }

    #[test]
    fn bind_mutates_only_present_members() {
        let source = MapPropertySource::new("test").with("pool.size", 8);
        let mut pool = Pool {
            name: "primary".to_string(),
            ..Pool::default()
        };
        ConfigBinder::new()
            .bind_instance(&mut pool, &source, "pool")
            .unwrap();
        assert_eq!(pool.size, 8);
        assert_eq!(pool.name, "primary");
    }

    #[test]
    fn bind_or_create_applies_literal_defaults() {
        let source = MapPropertySource::new("test").with("endpoint.url", "http://localhost");
        let endpoint: Endpoint = ConfigBinder::new().create(&source, "endpoint").unwrap();
        assert_eq!(endpoint.url, "http://localhost");
        assert_eq!(endpoint.timeout, 30);
        assert_eq!(endpoint.pool, Pool::default());
    }

    #[test]
    fn nested_property_object_is_bound_under_extended_prefix() {
        let source = MapPropertySource::new("test")
            .with("endpoint.url", "u")
            .with("endpoint.pool.size", "4")
            .with("endpoint.pool.tags", "a, b");
        let endpoint: Endpoint = ConfigBinder::new().create(&source, "endpoint").unwrap();
        assert_eq!(endpoint.pool.size, 4);
        assert_eq!(endpoint.pool.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn conversion_failure_names_key_and_type() {
        let source = MapPropertySource::new("test")
            .with("endpoint.url", "u")
            .with("endpoint.timeout", "soon");
        let err = ConfigBinder::new()
            .create::<Endpoint>(&source, "endpoint")
            .unwrap_err();
        match &err {
            IgnitionError::ConfigurationBind { type_name, prefix, .. } => {
                assert!(type_name.ends_with("Endpoint"));
                assert_eq!(prefix, "endpoint");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match err.root_cause() {
            IgnitionError::BindConversion { key, target, .. } => {
                assert_eq!(key, "endpoint.timeout");
                assert_eq!(target, "integer");
            }
            other => panic!("unexpected root cause: {other:?}"),
        }
    }

    #[test]
    fn coerces_relaxed_booleans() {
        for (raw, expected) in [("yes", true), ("OFF", false), ("1", true)] {
            match coerce(&ValueKind::Bool, &json!(raw)).unwrap() {
                BoundValue::Bool(value) => assert_eq!(value, expected, "{raw}"),
                other => panic!("unexpected value: {other:?}"),
            }
        }
        assert!(coerce(&ValueKind::Bool, &json!("maybe")).is_err());
    }

    #[test]
    fn coerces_enum_variants_loosely() {
        const VARIANTS: &[&str] = &["ReadOnly", "ReadWrite"];
        match coerce(&ValueKind::Enum(VARIANTS), &json!("read-write")).unwrap() {
            BoundValue::Text(value) => assert_eq!(value, "ReadWrite"),
            other => panic!("unexpected value: {other:?}"),
        }
        assert!(matches!(
            coerce(&ValueKind::Enum(VARIANTS), &json!("write-only")),
            Err(ConversionError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn text_joins_native_lists() {
        match coerce(&ValueKind::Text, &json!(["a", 1])).unwrap() {
            BoundValue::Text(value) => assert_eq!(value, "a,1"),
            other => panic!("unexpected value: {other:?}"),
        }
    }
}
