//! Bound values and their conversion into Rust types.

use super::descriptor::ValueKind;
use crate::error::{IgnitionError, Result};
use std::any::{Any, type_name};
use std::fmt;
use thiserror::Error;

/// A type-erased, owned configuration object.
pub type AnyValue = Box<dyn Any + Send + Sync>;

/// A value produced by the binder, already coerced to the shape of its member.
pub enum BoundValue {
    /// No source value and no default; converts to the member's zero value.
    Absent,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<BoundValue>),
    Object(AnyValue),
}

impl BoundValue {
    fn variant_name(&self) -> &'static str {
        match self {
            Self::Absent => "nothing",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    pub fn mismatch(&self, expected: &'static str) -> ConversionError {
        ConversionError::Mismatch {
            expected,
            found: self.variant_name().to_string(),
        }
    }

    /// Take the nested object out of this value.
    pub fn into_object<T: Any>(self) -> std::result::Result<T, ConversionError> {
        match self {
            Self::Object(value) => value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
                ConversionError::Mismatch {
                    expected: type_name::<T>(),
                    found: "object of another type".to_string(),
                }
            }),
            Self::Absent => Err(ConversionError::Missing),
            other => Err(other.mismatch(type_name::<T>())),
        }
    }
}

impl fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Why a raw or bound value could not become the requested type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("expected {expected} but found {found}")]
    Mismatch { expected: &'static str, found: String },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("'{value}' is not one of {expected:?}")]
    UnknownVariant { value: String, expected: Vec<String> },

    #[error("no value was bound")]
    Missing,
}

/// A type the binder can produce from a [`BoundValue`].
pub trait Bindable: Sized + Send + Sync + 'static {
    /// Shape the binder reads from the property source for this type.
    fn value_kind() -> ValueKind;

    /// Convert a bound value. [`BoundValue::Absent`] yields the zero value.
    fn from_bound(value: BoundValue) -> std::result::Result<Self, ConversionError>;

    /// Existing nested configuration object that can be bound in place.
    fn nested_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

impl Bindable for bool {
    fn value_kind() -> ValueKind {
        ValueKind::Bool
    }

    fn from_bound(value: BoundValue) -> std::result::Result<Self, ConversionError> {
        match value {
            BoundValue::Bool(v) => Ok(v),
            BoundValue::Absent => Ok(false),
            other => Err(other.mismatch("boolean")),
        }
    }
}

macro_rules! bindable_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bindable for $ty {
                fn value_kind() -> ValueKind {
                    ValueKind::Integer
                }

                fn from_bound(value: BoundValue) -> std::result::Result<Self, ConversionError> {
                    match value {
                        BoundValue::Integer(v) => <$ty>::try_from(v).map_err(|_| {
                            ConversionError::OutOfRange {
                                value: v.to_string(),
                                target: stringify!($ty),
                            }
                        }),
                        BoundValue::Absent => Ok(0),
                        other => Err(other.mismatch("integer")),
                    }
                }
            }
        )*
    };
}

bindable_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Bindable for f64 {
    fn value_kind() -> ValueKind {
        ValueKind::Float
    }

    fn from_bound(value: BoundValue) -> std::result::Result<Self, ConversionError> {
        match value {
            BoundValue::Float(v) => Ok(v),
            BoundValue::Integer(v) => Ok(v as f64),
            BoundValue::Absent => Ok(0.0),
            other => Err(other.mismatch("float")),
        }
    }
}

impl Bindable for f32 {
    fn value_kind() -> ValueKind {
        ValueKind::Float
    }

    fn from_bound(value: BoundValue) -> std::result::Result<Self, ConversionError> {
        f64::from_bound(value).map(|v| v as f32)
    }
}

impl Bindable for String {
    fn value_kind() -> ValueKind {
        ValueKind::Text
    }

    fn from_bound(value: BoundValue) -> std::result::Result<Self, ConversionError> {
        match value {
            BoundValue::Text(v) => Ok(v),
            BoundValue::Absent => Ok(String::new()),
            other => Err(other.mismatch("string")),
        }
    }
}

impl<T: Bindable> Bindable for Vec<T> {
    fn value_kind() -> ValueKind {
        ValueKind::List(Box::new(T::value_kind()))
    }

    fn from_bound(value: BoundValue) -> std::result::Result<Self, ConversionError> {
        match value {
            BoundValue::List(items) => items.into_iter().map(T::from_bound).collect(),
            BoundValue::Absent => Ok(Vec::new()),
            other => Err(other.mismatch("list")),
        }
    }
}

impl<T: Bindable> Bindable for Option<T> {
    fn value_kind() -> ValueKind {
        ValueKind::Optional(Box::new(T::value_kind()))
    }

    fn from_bound(value: BoundValue) -> std::result::Result<Self, ConversionError> {
        match value {
            BoundValue::Absent => Ok(None),
            value => T::from_bound(value).map(Some),
        }
    }

    fn nested_mut(&mut self) -> Option<&mut dyn Any> {
        self.as_mut().and_then(T::nested_mut)
    }
}

/// Implement [`Bindable`] for a field-less enum deriving strum's
/// `VariantNames` and `EnumString`, plus `Default` for the absent case.
///
/// ```
/// use ignition::bindable_enum;
/// use strum_macros::{EnumString, VariantNames};
///
/// #[derive(Debug, Default, PartialEq, EnumString, VariantNames)]
/// enum Mode {
///     #[default]
///     Simple,
///     Clustered,
/// }
///
/// bindable_enum!(Mode);
/// ```
#[macro_export]
macro_rules! bindable_enum {
    ($ty:ty) => {
        impl $crate::properties::Bindable for $ty {
            fn value_kind() -> $crate::properties::ValueKind {
                $crate::properties::ValueKind::Enum(
                    <$ty as $crate::strum::VariantNames>::VARIANTS,
                )
            }

            fn from_bound(
                value: $crate::properties::BoundValue,
            ) -> ::std::result::Result<Self, $crate::properties::ConversionError> {
                match value {
                    $crate::properties::BoundValue::Text(text) => {
                        text.parse::<$ty>().map_err(|_| {
                            $crate::properties::ConversionError::UnknownVariant {
                                expected: <$ty as $crate::strum::VariantNames>::VARIANTS
                                    .iter()
                                    .map(|variant| variant.to_string())
                                    .collect(),
                                value: text,
                            }
                        })
                    }
                    $crate::properties::BoundValue::Absent => {
                        Ok(<$ty as ::std::default::Default>::default())
                    }
                    other => Err(other.mismatch("enum")),
                }
            }
        }
    };
}

/// Bound constructor arguments, consumed in parameter order.
pub struct Arguments {
    type_name: String,
    values: std::vec::IntoIter<(String, BoundValue)>,
}

impl Arguments {
    pub fn new(type_name: impl Into<String>, values: Vec<(String, BoundValue)>) -> Self {
        Self {
            type_name: type_name.into(),
            values: values.into_iter(),
        }
    }

    pub fn empty(type_name: impl Into<String>) -> Self {
        Self::new(type_name, Vec::new())
    }

    /// Convert the next argument into `T`.
    pub fn take<T: Bindable>(&mut self) -> Result<T> {
        let (key, value) =
            self.values
                .next()
                .ok_or_else(|| IgnitionError::ConstructorInvocation {
                    type_name: self.type_name.clone(),
                    message: "constructor consumed more arguments than were bound".to_string(),
                })?;
        T::from_bound(value).map_err(|source| IgnitionError::BindConversion {
            key,
            target: type_name::<T>().to_string(),
            source,
        })
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_convert_to_zero() {
        assert!(!bool::from_bound(BoundValue::Absent).unwrap());
        assert_eq!(u16::from_bound(BoundValue::Absent).unwrap(), 0);
        assert_eq!(String::from_bound(BoundValue::Absent).unwrap(), "");
        assert!(Vec::<String>::from_bound(BoundValue::Absent).unwrap().is_empty());
        assert_eq!(Option::<i32>::from_bound(BoundValue::Absent).unwrap(), None);
    }

    #[test]
    fn integer_range_is_checked() {
        let err = u8::from_bound(BoundValue::Integer(300)).unwrap_err();
        assert_eq!(
            err,
            ConversionError::OutOfRange {
                value: "300".to_string(),
                target: "u8"
            }
        );
    }

    #[test]
    fn arguments_report_the_failing_key() {
        let mut args = Arguments::new(
            "Demo",
            vec![("demo.port".to_string(), BoundValue::Text("x".to_string()))],
        );
        match args.take::<u16>() {
            Err(IgnitionError::BindConversion { key, .. }) => assert_eq!(key, "demo.port"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            args.take::<u16>(),
            Err(IgnitionError::ConstructorInvocation { .. })
        ));
    }
}
