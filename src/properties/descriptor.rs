//! Introspection view of configuration types.
//!
//! Rust has no runtime reflection, so a configuration type describes itself:
//! its declarative markers, its constructors with their parameter lists, and
//! its settable properties. `#[derive(ConfigurationProperties)]` generates
//! these descriptors; they can also be assembled by hand.

use super::value::{AnyValue, Arguments, Bindable, BoundValue, ConversionError};
use crate::error::Result;
use dashmap::DashMap;
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

pub type ConstructorFn = Arc<dyn Fn(&mut Arguments) -> Result<AnyValue> + Send + Sync>;

pub type SetterFn =
    Arc<dyn Fn(&mut dyn Any, BoundValue) -> std::result::Result<(), ConversionError> + Send + Sync>;

pub type NestedAccessor =
    Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;

/// Semantic shape of a member.
#[derive(Clone)]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    Text,
    /// Enum-like text restricted to the listed variant names.
    Enum(&'static [&'static str]),
    List(Box<ValueKind>),
    Optional(Box<ValueKind>),
    /// A nested configuration object.
    Nested(fn() -> TypeDescriptor),
}

impl ValueKind {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "string",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Optional(_) => "optional",
            Self::Nested(_) => "object",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Integer | Self::Float | Self::Text | Self::Enum(_)
        )
    }
}

impl fmt::Debug for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(variants) => f.debug_tuple("Enum").field(variants).finish(),
            Self::List(inner) => f.debug_tuple("List").field(inner).finish(),
            Self::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Self::Nested(_) => f.write_str("Nested(..)"),
            scalar => f.write_str(scalar.describe()),
        }
    }
}

/// Default applied to a constructor parameter when the source has no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// Marker without a literal: an empty collection, a zero scalar or an
    /// empty nested instance.
    Empty,
    /// Literal text coerced like a source value. Lists split on `,`.
    Literal(String),
}

#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    name: String,
    kind: ValueKind,
    default_value: Option<DefaultValue>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default_value: None,
        }
    }

    pub fn of<T: Bindable>(name: impl Into<String>) -> Self {
        Self::new(name, T::value_kind())
    }

    pub fn with_default(mut self, default_value: DefaultValue) -> Self {
        self.default_value = Some(default_value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default_value.as_ref()
    }
}

#[derive(Clone)]
pub struct ConstructorDescriptor {
    parameters: Vec<ParameterDescriptor>,
    constructor_binding: bool,
    primary: bool,
    invoke: ConstructorFn,
}

impl ConstructorDescriptor {
    pub fn new<F>(parameters: Vec<ParameterDescriptor>, invoke: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<AnyValue> + Send + Sync + 'static,
    {
        Self {
            parameters,
            constructor_binding: false,
            primary: false,
            invoke: Arc::new(invoke),
        }
    }

    /// Zero-argument constructor backed by `Default`.
    pub fn default_of<T: Default + Any + Send + Sync>() -> Self {
        Self::new(Vec::new(), |_| Ok(Box::new(T::default()) as AnyValue))
    }

    /// Carry the constructor-binding marker on this constructor.
    pub fn marked(mut self) -> Self {
        self.constructor_binding = true;
        self
    }

    /// Designate this as the type's primary constructor.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_marked(&self) -> bool {
        self.constructor_binding
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn invoke(&self, mut arguments: Arguments) -> Result<AnyValue> {
        (self.invoke)(&mut arguments)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("parameters", &self.parameters)
            .field("constructor_binding", &self.constructor_binding)
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    kind: ValueKind,
    setter: SetterFn,
    nested: Option<NestedAccessor>,
}

impl PropertyDescriptor {
    pub fn new<F>(name: impl Into<String>, kind: ValueKind, setter: F) -> Self
    where
        F: Fn(&mut dyn Any, BoundValue) -> std::result::Result<(), ConversionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            kind,
            setter: Arc::new(setter),
            nested: None,
        }
    }

    /// Property backed by a field of `O`, reached through `field`.
    pub fn field<O, T>(name: impl Into<String>, field: fn(&mut O) -> &mut T) -> Self
    where
        O: Any,
        T: Bindable,
    {
        let mut property = Self::new(name, T::value_kind(), move |target, value| {
            let owner = target
                .downcast_mut::<O>()
                .ok_or_else(|| ConversionError::Mismatch {
                    expected: type_name::<O>(),
                    found: "another type".to_string(),
                })?;
            *field(owner) = T::from_bound(value)?;
            Ok(())
        });
        property.nested = Some(nested_accessor(move |target| {
            target
                .downcast_mut::<O>()
                .and_then(|owner| field(owner).nested_mut())
        }));
        property
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn set(
        &self,
        target: &mut dyn Any,
        value: BoundValue,
    ) -> std::result::Result<(), ConversionError> {
        (self.setter)(target, value)
    }

    /// Existing nested instance held by `target`, if this member exposes one.
    pub fn nested_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        self.nested.as_ref().and_then(|accessor| accessor(target))
    }
}

fn nested_accessor<F>(accessor: F) -> NestedAccessor
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync + 'static,
{
    Arc::new(accessor)
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Declarative markers plus constructor and property signatures of a type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    type_name: String,
    type_id: Option<TypeId>,
    prefix: Option<String>,
    constructor_binding: bool,
    constructors: Vec<ConstructorDescriptor>,
    properties: Vec<PropertyDescriptor>,
}

impl TypeDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            type_id: None,
            prefix: None,
            constructor_binding: false,
            constructors: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn of<T: Any>() -> Self {
        Self {
            type_id: Some(TypeId::of::<T>()),
            ..Self::new(type_name::<T>())
        }
    }

    /// Mark the type as configuration properties bound under `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Type-level constructor-binding marker.
    pub fn constructor_binding(mut self) -> Self {
        self.constructor_binding = true;
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn is_constructor_binding(&self) -> bool {
        self.constructor_binding
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn primary_constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructors.iter().find(|c| c.is_primary())
    }

    pub fn default_constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructors.iter().find(|c| c.parameter_count() == 0)
    }
}

/// A type that can describe itself to the binder.
pub trait Introspect: Any + Send + Sync {
    fn type_descriptor() -> TypeDescriptor;
}

/// Looks up type descriptors by name.
pub trait TypeIntrospector: Send + Sync {
    fn describe(&self, type_name: &str) -> Option<TypeDescriptor>;
}

/// A [`TypeIntrospector`] over explicitly added types.
#[derive(Default)]
pub struct TypeCatalog {
    types: DashMap<String, fn() -> TypeDescriptor>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T: Introspect>(&self) -> &Self {
        self.types
            .insert(type_name::<T>().to_string(), T::type_descriptor);
        self
    }

    pub fn add_descriptor(&self, type_name: impl Into<String>, descriptor: fn() -> TypeDescriptor) {
        self.types.insert(type_name.into(), descriptor);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeIntrospector for TypeCatalog {
    fn describe(&self, type_name: &str) -> Option<TypeDescriptor> {
        self.types.get(type_name).map(|descriptor| (*descriptor)())
    }
}
