//! Configuration properties: type descriptors, property sources, strategy
//! resolution, the binder and the registry of configuration types.

mod binder;
mod descriptor;
mod name;
mod registry;
mod source;
mod strategy;
mod value;

pub use binder::ConfigBinder;
pub use descriptor::{
    ConstructorDescriptor, ConstructorFn, DefaultValue, Introspect, NestedAccessor,
    ParameterDescriptor, PropertyDescriptor, SetterFn, TypeCatalog, TypeDescriptor,
    TypeIntrospector, ValueKind,
};
pub use name::{child_key, indexed_key, is_descendant, normalize_key};
pub use registry::{
    BeanInstance, ConfigBeanRegistry, ConfigurationDefinition, ConfigurationType, Construction,
    InstanceSupplier,
};
pub use source::{CommandLinePropertySource, MapPropertySource, PropertySource};
pub use strategy::{BindStrategy, BindStrategyResolver};
pub use value::{AnyValue, Arguments, Bindable, BoundValue, ConversionError};
