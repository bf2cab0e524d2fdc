//! Registration of configuration types and the container-facing hooks that
//! materialize them.

use super::binder::ConfigBinder;
use super::descriptor::{ConstructorDescriptor, Introspect, TypeDescriptor, TypeIntrospector};
use super::source::PropertySource;
use super::strategy::BindStrategy;
use super::value::{AnyValue, Arguments};
use crate::error::{IgnitionError, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// A configuration target: a described type plus the prefix it binds under.
#[derive(Debug, Clone)]
pub struct ConfigurationType {
    descriptor: TypeDescriptor,
    prefix: String,
}

impl ConfigurationType {
    pub fn new(descriptor: TypeDescriptor, prefix: impl Into<String>) -> Self {
        Self {
            descriptor,
            prefix: prefix.into(),
        }
    }

    /// Configuration type for `T`, bound under the prefix `T` declares.
    ///
    /// Fails with [`IgnitionError::NoBindStrategy`] when `T` is not marked as
    /// configuration properties. Use [`ConfigurationType::new`] to bind an
    /// unmarked type under an explicit prefix.
    pub fn of<T: Introspect>() -> Result<Self> {
        let descriptor = T::type_descriptor();
        let prefix = descriptor.prefix().map(str::to_string).ok_or_else(|| {
            IgnitionError::no_bind_strategy(
                descriptor.type_name(),
                "type is not marked as configuration properties",
            )
        })?;
        Ok(Self { descriptor, prefix })
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn type_name(&self) -> &str {
        self.descriptor.type_name()
    }

    /// `prefix-typeName`, or the bare type name when the prefix is empty.
    pub fn identity_key(&self) -> String {
        if self.prefix.is_empty() {
            self.type_name().to_string()
        } else {
            format!("{}-{}", self.prefix, self.type_name())
        }
    }
}

/// Deferred construction of a fully bound instance.
#[derive(Clone)]
pub struct InstanceSupplier(Arc<dyn Fn() -> Result<AnyValue> + Send + Sync>);

impl InstanceSupplier {
    pub fn new<F>(supplier: F) -> Self
    where
        F: Fn() -> Result<AnyValue> + Send + Sync + 'static,
    {
        Self(Arc::new(supplier))
    }

    pub fn get(&self) -> Result<AnyValue> {
        (self.0)()
    }
}

impl fmt::Debug for InstanceSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InstanceSupplier(..)")
    }
}

#[derive(Debug, Clone)]
pub enum Construction {
    /// Values are bound while the instance is created.
    Deferred(InstanceSupplier),
    /// Default construction; values are bound by [`ConfigBeanRegistry::after_construction`].
    Standard { recipe: ConstructorDescriptor },
}

#[derive(Debug)]
pub struct ConfigurationDefinition {
    bean_name: String,
    configuration_type: ConfigurationType,
    strategy: BindStrategy,
    construction: Construction,
}

impl ConfigurationDefinition {
    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    pub fn configuration_type(&self) -> &ConfigurationType {
        &self.configuration_type
    }

    pub fn strategy(&self) -> BindStrategy {
        self.strategy
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    /// Whether instances still need [`ConfigBeanRegistry::after_construction`].
    pub fn requires_post_bind(&self) -> bool {
        self.strategy == BindStrategy::Property
    }
}

/// An instance produced for a definition, tagged with its bind state.
pub struct BeanInstance {
    bean_name: String,
    value: AnyValue,
    bound: bool,
}

impl BeanInstance {
    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn value(&self) -> &AnyValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut AnyValue {
        &mut self.value
    }

    pub fn into_value(self) -> AnyValue {
        self.value
    }

    pub fn downcast<T: 'static>(self) -> Result<T> {
        self.value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| IgnitionError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }
}

impl fmt::Debug for BeanInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanInstance")
            .field("bean_name", &self.bean_name)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

/// Registers configuration types once and materializes their instances on request.
pub struct ConfigBeanRegistry {
    binder: Arc<ConfigBinder>,
    source: Arc<dyn PropertySource>,
    introspector: Option<Arc<dyn TypeIntrospector>>,
    definitions: DashMap<String, Arc<ConfigurationDefinition>>,
    by_type: DashMap<TypeId, String>,
    order: Mutex<Vec<String>>,
}

impl ConfigBeanRegistry {
    pub fn new(source: Arc<dyn PropertySource>) -> Self {
        Self::with_binder(Arc::new(ConfigBinder::new()), source)
    }

    pub fn with_binder(binder: Arc<ConfigBinder>, source: Arc<dyn PropertySource>) -> Self {
        Self {
            binder,
            source,
            introspector: None,
            definitions: DashMap::new(),
            by_type: DashMap::new(),
            order: Mutex::new(Vec::new()),
        }
    }

    pub fn with_introspector(mut self, introspector: Arc<dyn TypeIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    pub fn binder(&self) -> &ConfigBinder {
        &self.binder
    }

    /// Register a configuration type. Registering the same identity key again
    /// returns the existing definition.
    pub fn register(
        &self,
        configuration_type: ConfigurationType,
    ) -> Result<Arc<ConfigurationDefinition>> {
        let bean_name = configuration_type.identity_key();
        match self.definitions.entry(bean_name.clone()) {
            Entry::Occupied(existing) => {
                tracing::debug!(%bean_name, "configuration type already registered");
                Ok(existing.get().clone())
            }
            Entry::Vacant(vacant) => {
                let definition = Arc::new(self.create_definition(bean_name.clone(), configuration_type)?);
                vacant.insert(definition.clone());
                if let Some(type_id) = definition.configuration_type.descriptor.type_id() {
                    self.by_type.entry(type_id).or_insert_with(|| bean_name.clone());
                }
                self.order
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(bean_name.clone());
                tracing::info!(
                    %bean_name,
                    strategy = %definition.strategy,
                    "registered configuration type"
                );
                Ok(definition)
            }
        }
    }

    pub fn register_type<T: Introspect>(&self) -> Result<Arc<ConfigurationDefinition>> {
        self.register(ConfigurationType::of::<T>()?)
    }

    /// Register a type known to the introspector by name.
    ///
    /// `prefix` overrides the prefix declared on the type.
    pub fn register_named(
        &self,
        type_name: &str,
        prefix: Option<&str>,
    ) -> Result<Arc<ConfigurationDefinition>> {
        let descriptor = self
            .introspector
            .as_ref()
            .and_then(|introspector| introspector.describe(type_name))
            .ok_or_else(|| {
                IgnitionError::no_bind_strategy(type_name, "type is unknown to the introspector")
            })?;
        let declared = descriptor.prefix().map(str::to_string).ok_or_else(|| {
            IgnitionError::no_bind_strategy(type_name, "type is not marked as configuration properties")
        })?;
        let prefix = prefix.map(str::to_string).unwrap_or(declared);
        self.register(ConfigurationType::new(descriptor, prefix))
    }

    fn create_definition(
        &self,
        bean_name: String,
        configuration_type: ConfigurationType,
    ) -> Result<ConfigurationDefinition> {
        let descriptor = configuration_type.descriptor();
        let strategy = self.binder.resolver().resolve(descriptor)?;
        let construction = match strategy {
            BindStrategy::Constructor => {
                let binder = self.binder.clone();
                let source = self.source.clone();
                let descriptor = descriptor.clone();
                let prefix = configuration_type.prefix().to_string();
                Construction::Deferred(InstanceSupplier::new(move || {
                    binder.bind_or_create(&descriptor, source.as_ref(), &prefix)
                }))
            }
            BindStrategy::Property => {
                let recipe = descriptor.default_constructor().cloned().ok_or_else(|| {
                    IgnitionError::no_bind_strategy(
                        descriptor.type_name(),
                        "property binding needs a zero-argument constructor",
                    )
                })?;
                Construction::Standard { recipe }
            }
        };
        Ok(ConfigurationDefinition {
            bean_name,
            configuration_type,
            strategy,
            construction,
        })
    }

    pub fn definition(&self, bean_name: &str) -> Result<Arc<ConfigurationDefinition>> {
        self.definitions
            .get(bean_name)
            .map(|definition| definition.clone())
            .ok_or_else(|| IgnitionError::DefinitionNotFound {
                name: bean_name.to_string(),
            })
    }

    /// Definition of the first registration of `T`.
    pub fn definition_for<T: 'static>(&self) -> Option<Arc<ConfigurationDefinition>> {
        let bean_name = self.by_type.get(&TypeId::of::<T>())?.clone();
        self.definition(&bean_name).ok()
    }

    pub fn contains(&self, bean_name: &str) -> bool {
        self.definitions.contains_key(bean_name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Bean names in registration order.
    pub fn bean_names(&self) -> Vec<String> {
        self.order
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Materialize an instance for `definition`.
    ///
    /// Deferred definitions produce a bound instance. Standard definitions
    /// produce a default-constructed one that still needs
    /// [`ConfigBeanRegistry::after_construction`].
    pub fn on_bean_requested(&self, definition: &ConfigurationDefinition) -> Result<BeanInstance> {
        tracing::debug!(bean_name = %definition.bean_name, "materializing configuration bean");
        let (value, bound) = match &definition.construction {
            Construction::Deferred(supplier) => (supplier.get()?, true),
            Construction::Standard { recipe } => (
                recipe.invoke(Arguments::empty(definition.configuration_type.type_name()))?,
                false,
            ),
        };
        Ok(BeanInstance {
            bean_name: definition.bean_name.clone(),
            value,
            bound,
        })
    }

    /// Bind values onto a default-constructed instance. Instances that are
    /// already bound are left untouched.
    pub fn after_construction(
        &self,
        instance: &mut BeanInstance,
        definition: &ConfigurationDefinition,
    ) -> Result<()> {
        if instance.bound {
            tracing::trace!(bean_name = %instance.bean_name, "instance already bound");
            return Ok(());
        }
        if definition.strategy == BindStrategy::Constructor {
            return Err(IgnitionError::InvalidBindTarget {
                bean_name: definition.bean_name.clone(),
                reason: "constructor-bound types cannot be bound after construction".to_string(),
            });
        }
        let configuration_type = &definition.configuration_type;
        self.binder.bind(
            instance.value.as_mut(),
            configuration_type.descriptor(),
            self.source.as_ref(),
            configuration_type.prefix(),
        )?;
        instance.bound = true;
        Ok(())
    }

    /// Run both hooks for `definition` and return the bound value.
    pub fn materialize(&self, definition: &ConfigurationDefinition) -> Result<AnyValue> {
        let mut instance = self.on_bean_requested(definition)?;
        if definition.requires_post_bind() {
            self.after_construction(&mut instance, definition)?;
        }
        Ok(instance.into_value())
    }
}

impl fmt::Debug for ConfigBeanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigBeanRegistry")
            .field("source", &self.source.name())
            .field("definitions", &self.definitions.len())
            .finish_non_exhaustive()
    }
}
