use crate::config::Environment;
use crate::di::Container;
use crate::error::Result;
use crate::event::ApplicationListener;
use crate::lifecycle::ApplicationContext;
use crate::properties::{ConfigurationType, Introspect, TypeIntrospector};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Builder for constructing a dependency injection container
///
/// Collects services, configuration types and listeners, then registers
/// them against one environment.
///
/// # Example
/// ```
/// use ignition::{ContainerBuilder, Environment, MapPropertySource};
/// use std::sync::Arc;
///
/// let environment = Environment::new();
/// environment.add_last(Arc::new(MapPropertySource::new("defaults").with("app.name", "demo")));
///
/// let container = ContainerBuilder::new()
///     .environment(environment)
///     .register(42_u32)
///     .build()
///     .unwrap();
/// assert_eq!(*container.resolve::<u32>().unwrap(), 42);
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    environment: Environment,
    introspector: Option<Arc<dyn TypeIntrospector>>,
    services: Vec<(TypeId, Arc<dyn Any + Send + Sync>)>,
    configurations: Vec<Result<ConfigurationType>>,
    listeners: Vec<Arc<dyn ApplicationListener>>,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Property sources the configuration beans are bound from
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Enable registration of configuration types by name
    pub fn introspector(mut self, introspector: Arc<dyn TypeIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// Register a service instance
    pub fn register<T: 'static + Send + Sync>(mut self, instance: T) -> Self {
        self.services.push((TypeId::of::<T>(), Arc::new(instance)));
        self
    }

    /// Register a configuration type under its declared prefix
    pub fn configuration<T: Introspect>(mut self) -> Self {
        self.configurations.push(ConfigurationType::of::<T>());
        self
    }

    pub fn configuration_type(mut self, configuration_type: ConfigurationType) -> Self {
        self.configurations.push(Ok(configuration_type));
        self
    }

    pub fn listener(mut self, listener: Arc<dyn ApplicationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Build the container
    ///
    /// Fails if a configuration type is unmarked or has no usable bind strategy.
    pub fn build(self) -> Result<Container> {
        let mut container = Container::from_parts(self.environment, self.introspector);
        for (type_id, instance) in self.services {
            container.insert_service(type_id, instance);
        }
        for configuration_type in self.configurations {
            container.register_configuration_type(configuration_type?)?;
        }
        for listener in self.listeners {
            container.add_application_listener(listener);
        }
        Ok(container)
    }
}
