use crate::config::Environment;
use crate::error::{IgnitionError, Result};
use crate::event::{ApplicationEvent, ApplicationListener, PhaseEventBus};
use crate::lifecycle::{self, ApplicationContext, LifecycleError};
use crate::properties::{
    ConfigBeanRegistry, ConfigurationDefinition, ConfigurationType, Introspect, PropertySource,
    TypeIntrospector,
};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

type Instance = Arc<dyn Any + Send + Sync>;

/// Thread-safe dependency injection container.
///
/// Holds plain services keyed by type, the configuration registry and the
/// configuration beans it produces, plus the container's own event
/// multicaster once the container is refreshed.
pub struct Container {
    services: DashMap<TypeId, ServiceEntry>,
    environment: Environment,
    registry: ConfigBeanRegistry,
    configuration_beans: DashMap<String, Instance>,
    listeners: RwLock<Vec<Arc<dyn ApplicationListener>>>,
    multicaster: OnceLock<PhaseEventBus>,
    active: AtomicBool,
}

#[derive(Clone)]
struct ServiceEntry {
    instance: Instance,
}

impl Container {
    pub fn new() -> Self {
        Self::with_environment(Environment::new())
    }

    pub fn with_environment(environment: Environment) -> Self {
        Self::from_parts(environment, None)
    }

    pub(crate) fn from_parts(
        environment: Environment,
        introspector: Option<Arc<dyn TypeIntrospector>>,
    ) -> Self {
        let source: Arc<dyn PropertySource> = Arc::new(environment.clone());
        let mut registry = ConfigBeanRegistry::new(source);
        if let Some(introspector) = introspector {
            registry = registry.with_introspector(introspector);
        }
        Self {
            services: DashMap::new(),
            environment,
            registry,
            configuration_beans: DashMap::new(),
            listeners: RwLock::new(Vec::new()),
            multicaster: OnceLock::new(),
            active: AtomicBool::new(false),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn registry(&self) -> &ConfigBeanRegistry {
        &self.registry
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.insert_service(TypeId::of::<T>(), Arc::new(instance));
        self
    }

    pub(crate) fn insert_service(&mut self, type_id: TypeId, instance: Instance) {
        self.services.insert(type_id, ServiceEntry { instance });
    }

    /// Register `T` as a configuration type bound under its declared prefix.
    pub fn register_configuration<T: Introspect>(&self) -> Result<Arc<ConfigurationDefinition>> {
        self.registry.register_type::<T>()
    }

    pub fn register_configuration_type(
        &self,
        configuration_type: ConfigurationType,
    ) -> Result<Arc<ConfigurationDefinition>> {
        self.registry.register(configuration_type)
    }

    /// Resolve a service, falling back to a configuration bean of type `T`.
    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        if let Some(entry) = self.services.get(&TypeId::of::<T>()) {
            return downcast(entry.instance.clone());
        }
        if self.registry.definition_for::<T>().is_some() {
            return self.configuration::<T>();
        }
        Err(IgnitionError::DependencyNotFound {
            type_name: std::any::type_name::<T>().to_string(),
        })
    }

    /// The bound configuration bean of type `T`, created on first request.
    pub fn configuration<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let definition =
            self.registry
                .definition_for::<T>()
                .ok_or_else(|| IgnitionError::DependencyNotFound {
                    type_name: std::any::type_name::<T>().to_string(),
                })?;
        downcast(self.configuration_bean(&definition)?)
    }

    /// The bean registered under `bean_name`, created on first request.
    pub fn configuration_by_name(&self, bean_name: &str) -> Result<Instance> {
        let definition = self.registry.definition(bean_name)?;
        self.configuration_bean(&definition)
    }

    fn configuration_bean(&self, definition: &ConfigurationDefinition) -> Result<Instance> {
        let bean = self
            .configuration_beans
            .entry(definition.bean_name().to_string())
            .or_try_insert_with(|| self.registry.materialize(definition).map(Instance::from))?;
        Ok(bean.value().clone())
    }

    /// Initialize the multicaster, create every configuration bean and mark
    /// the container active.
    pub fn refresh(&self) -> Result<()> {
        let multicaster = self.multicaster.get_or_init(PhaseEventBus::new);
        for listener in self.application_listeners() {
            multicaster.register(listener);
        }
        for bean_name in self.registry.bean_names() {
            self.configuration_by_name(&bean_name)?;
        }
        self.active.store(true, Ordering::SeqCst);
        tracing::info!(
            services = self.services.len(),
            configuration_beans = self.configuration_beans.len(),
            "container refreshed"
        );
        Ok(())
    }

    pub fn close(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
            || self.registry.definition_for::<T>().is_some()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn downcast<T: 'static + Send + Sync>(instance: Instance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| IgnitionError::DowncastFailed {
            type_name: std::any::type_name::<T>().to_string(),
        })
}

impl ApplicationContext for Container {
    fn add_application_listener(&self, listener: Arc<dyn ApplicationListener>) {
        if let Some(multicaster) = self.multicaster.get() {
            multicaster.register(listener.clone());
        }
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !listeners
            .iter()
            .any(|known| std::ptr::addr_eq(Arc::as_ptr(known), Arc::as_ptr(&listener)))
        {
            listeners.push(listener);
        }
    }

    fn publish_event(&self, event: &dyn ApplicationEvent) -> lifecycle::Result<()> {
        let multicaster = self
            .multicaster
            .get()
            .ok_or(LifecycleError::MulticasterUnavailable)?;
        multicaster.publish(event);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn application_listeners(&self) -> Vec<Arc<dyn ApplicationListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.services.len())
            .field("environment", &self.environment)
            .field("registry", &self.registry)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ApplicationStartingEvent;
    use crate::properties::{
        ConstructorDescriptor, MapPropertySource, PropertyDescriptor, TypeDescriptor,
    };
    use std::sync::atomic::AtomicUsize;

    struct TestService {
        value: i32,
    }

    #[derive(Debug, Default)]
    struct Limits {
        max: u32,
    }

    impl Introspect for Limits {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Self>()
                .with_prefix("limits")
                .with_constructor(ConstructorDescriptor::default_of::<Self>())
                .with_property(PropertyDescriptor::field::<Self, u32>("max", |l| &mut l.max))
        }
    }

    struct Counter(AtomicUsize);

    impl ApplicationListener for Counter {
        fn on_application_event(&self, _event: &dyn ApplicationEvent) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn environment() -> Environment {
        let environment = Environment::new();
        environment.add_last(Arc::new(MapPropertySource::new("test").with("limits.max", 7)));
        environment
    }

    #[test]
    fn test_register_and_resolve() {
        let mut container = Container::new();
        container.register(TestService { value: 42 });
        let service = container.resolve::<TestService>().unwrap();
        assert_eq!(service.value, 42);
        assert!(matches!(
            container.resolve::<String>(),
            Err(IgnitionError::DependencyNotFound { .. })
        ));
    }

    #[test]
    fn configuration_beans_are_created_once() {
        let container = Container::with_environment(environment());
        container.register_configuration::<Limits>().unwrap();

        let first = container.configuration::<Limits>().unwrap();
        let second = container.resolve::<Limits>().unwrap();
        assert_eq!(first.max, 7);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn publishing_needs_a_refreshed_container() {
        let container = Container::with_environment(environment());
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        container.add_application_listener(counter.clone());

        assert!(matches!(
            container.publish_event(&ApplicationStartingEvent::new("test")),
            Err(LifecycleError::MulticasterUnavailable)
        ));
        assert!(!container.is_active());

        container.refresh().unwrap();
        assert!(container.is_active());
        container
            .publish_event(&ApplicationStartingEvent::new("test"))
            .unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
