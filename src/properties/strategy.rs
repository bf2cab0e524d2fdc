//! Bind strategy resolution.

use super::descriptor::{ConstructorDescriptor, TypeDescriptor};
use crate::error::{IgnitionError, Result};
use strum_macros::{Display, EnumString};

/// How a configuration object gets its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BindStrategy {
    /// Values are bound first and passed to a constructor.
    Constructor,
    /// The object is default-constructed and its properties are set afterwards.
    Property,
}

/// Decides, per type, between constructor and property binding.
///
/// Resolution is pure: the same descriptor always yields the same verdict.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindStrategyResolver;

impl BindStrategyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Strategy for a top-level configuration type.
    pub fn resolve(&self, ty: &TypeDescriptor) -> Result<BindStrategy> {
        self.resolve_with(ty, false)
    }

    /// Strategy for a type bound as a nested value object.
    pub fn resolve_nested(&self, ty: &TypeDescriptor) -> Result<BindStrategy> {
        self.resolve_with(ty, true)
    }

    fn resolve_with(&self, ty: &TypeDescriptor, nested: bool) -> Result<BindStrategy> {
        let strategy = match self.bind_constructor(ty, nested)? {
            Some(_) => BindStrategy::Constructor,
            None => BindStrategy::Property,
        };
        tracing::debug!(type_name = ty.type_name(), nested, %strategy, "resolved bind strategy");
        Ok(strategy)
    }

    /// The constructor values are bound through, or `None` for property binding.
    pub fn bind_constructor<'a>(
        &self,
        ty: &'a TypeDescriptor,
        nested: bool,
    ) -> Result<Option<&'a ConstructorDescriptor>> {
        if let Some(constructor) = self.find_marked_constructor(ty)? {
            return Ok(Some(constructor));
        }
        if ty.is_constructor_binding() || nested {
            return Ok(self.deduce_constructor(ty));
        }
        Ok(None)
    }

    fn find_marked_constructor<'a>(
        &self,
        ty: &'a TypeDescriptor,
    ) -> Result<Option<&'a ConstructorDescriptor>> {
        if ty
            .constructors()
            .iter()
            .any(|c| c.is_marked() && c.parameter_count() == 0)
        {
            return Err(IgnitionError::NoArgBindConstructor {
                type_name: ty.type_name().to_string(),
            });
        }

        let marked: Vec<&ConstructorDescriptor> = match ty.primary_constructor() {
            Some(primary) => std::iter::once(primary).filter(|c| c.is_marked()).collect(),
            None => ty.constructors().iter().filter(|c| c.is_marked()).collect(),
        };
        match marked.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => Err(IgnitionError::AmbiguousBindConstructor {
                type_name: ty.type_name().to_string(),
                count: many.len(),
            }),
        }
    }

    fn deduce_constructor<'a>(&self, ty: &'a TypeDescriptor) -> Option<&'a ConstructorDescriptor> {
        if let Some(primary) = ty.primary_constructor() {
            return (primary.parameter_count() > 0).then_some(primary);
        }
        match ty.constructors() {
            [only] if only.parameter_count() > 0 => Some(only),
            _ => None,
        }
    }
}
