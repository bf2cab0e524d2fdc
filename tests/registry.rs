//! Configuration registry and container materialization.

use ignition::properties::{
    BindStrategy, ConfigBeanRegistry, ConfigurationType, Introspect, MapPropertySource,
    PropertySource, TypeCatalog,
};
use ignition::{ConfigurationProperties, ContainerBuilder, Environment, IgnitionError};
use std::sync::Arc;

mod common;

#[derive(Debug, Default, PartialEq, ConfigurationProperties)]
#[config(prefix = "mail")]
pub struct MailProperties {
    host: String,
    port: u16,
}

#[derive(Debug, PartialEq, ConfigurationProperties)]
#[config(prefix = "mail", constructor_binding)]
pub struct ImmutableMailProperties {
    host: String,
    #[config(default = "25")]
    port: u16,
}

#[derive(Debug, Default, PartialEq, ConfigurationProperties)]
pub struct RelaySettings {
    host: String,
}

fn source() -> Arc<dyn PropertySource> {
    Arc::new(
        MapPropertySource::new("application")
            .with("mail.host", "smtp.example.org")
            .with("mail.port", 587),
    )
}

#[test]
fn same_type_and_prefix_register_once() {
    let registry = ConfigBeanRegistry::new(source());
    registry.register_type::<MailProperties>().unwrap();
    registry.register_type::<MailProperties>().unwrap();
    registry
        .register(ConfigurationType::of::<MailProperties>().unwrap())
        .unwrap();
    assert_eq!(registry.len(), 1);

    let other_prefix = ConfigurationType::new(
        ConfigurationType::of::<MailProperties>()
            .unwrap()
            .descriptor()
            .clone(),
        "backup-mail",
    );
    registry.register(other_prefix).unwrap();
    assert_eq!(registry.len(), 2);
}

#[test]
fn concurrent_registration_keeps_one_definition() {
    let registry = Arc::new(ConfigBeanRegistry::new(source()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || registry.register_type::<MailProperties>().unwrap())
        })
        .collect();
    let definitions: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(registry.len(), 1);
    assert!(
        definitions
            .windows(2)
            .all(|pair| Arc::ptr_eq(&pair[0], &pair[1]))
    );
}

#[test]
fn strategies_follow_the_declared_markers() {
    let registry = ConfigBeanRegistry::new(source());
    let by_set = registry.register_type::<MailProperties>().unwrap();
    let by_constructor = registry.register_type::<ImmutableMailProperties>().unwrap();

    assert_eq!(by_set.strategy(), BindStrategy::Property);
    assert!(by_set.requires_post_bind());
    assert_eq!(by_constructor.strategy(), BindStrategy::Constructor);
    assert!(!by_constructor.requires_post_bind());
}

#[test]
fn after_construction_does_not_rebind_constructor_beans() {
    let registry = ConfigBeanRegistry::new(source());
    let definition = registry.register_type::<ImmutableMailProperties>().unwrap();

    let mut instance = registry.on_bean_requested(&definition).unwrap();
    assert!(instance.is_bound());
    registry.after_construction(&mut instance, &definition).unwrap();
    registry.after_construction(&mut instance, &definition).unwrap();

    let mail = instance.downcast::<ImmutableMailProperties>().unwrap();
    assert_eq!(
        mail,
        ImmutableMailProperties {
            host: "smtp.example.org".to_string(),
            port: 587,
        }
    );
}

#[test]
fn after_construction_binds_property_beans_once() {
    let registry = ConfigBeanRegistry::new(source());
    let definition = registry.register_type::<MailProperties>().unwrap();

    let mut instance = registry.on_bean_requested(&definition).unwrap();
    registry.after_construction(&mut instance, &definition).unwrap();
    instance
        .value_mut()
        .downcast_mut::<MailProperties>()
        .unwrap()
        .host = "changed".to_string();
    registry.after_construction(&mut instance, &definition).unwrap();

    let mail = instance.downcast::<MailProperties>().unwrap();
    assert_eq!(mail.host, "changed");
    assert_eq!(mail.port, 587);
}

#[test]
fn unknown_names_have_no_bind_strategy() {
    let catalog = TypeCatalog::new();
    catalog.add::<MailProperties>();
    let registry = ConfigBeanRegistry::new(source()).with_introspector(Arc::new(catalog));

    let definition = registry
        .register_named(std::any::type_name::<MailProperties>(), Some("relay"))
        .unwrap();
    assert_eq!(definition.configuration_type().prefix(), "relay");

    let err = registry.register_named("NotAType", None).unwrap_err();
    assert!(matches!(err, IgnitionError::NoBindStrategy { .. }));
    assert!(matches!(
        registry.definition("missing"),
        Err(IgnitionError::DefinitionNotFound { .. })
    ));
}

#[test]
fn container_refresh_binds_every_registered_type() {
    common::init_tracing();
    let environment = Environment::new();
    environment.add_last(source());

    let container = ContainerBuilder::new()
        .environment(environment)
        .configuration::<MailProperties>()
        .configuration::<ImmutableMailProperties>()
        .build()
        .unwrap();
    container.refresh().unwrap();

    let by_set = container.configuration::<MailProperties>().unwrap();
    let by_constructor = container.resolve::<ImmutableMailProperties>().unwrap();
    assert_eq!(by_set.host, by_constructor.host);
    assert_eq!(by_set.port, by_constructor.port);
    assert!(Arc::ptr_eq(
        &by_set,
        &container.configuration::<MailProperties>().unwrap()
    ));
}

#[test]
fn binding_errors_surface_from_refresh() {
    let environment = Environment::new();
    environment.add_last(Arc::new(
        MapPropertySource::new("broken").with("mail.port", "not-a-port"),
    ));
    let container = ContainerBuilder::new()
        .environment(environment)
        .configuration::<ImmutableMailProperties>()
        .build()
        .unwrap();

    let err = container.refresh().unwrap_err();
    assert!(matches!(err, IgnitionError::ConfigurationBind { .. }));
}

#[test]
fn unmarked_types_are_rejected_unless_given_a_prefix() {
    let registry = ConfigBeanRegistry::new(source());
    assert!(matches!(
        registry.register_type::<RelaySettings>(),
        Err(IgnitionError::NoBindStrategy { .. })
    ));
    assert!(ConfigurationType::of::<RelaySettings>().is_err());
    assert!(registry.is_empty());

    let explicit = ConfigurationType::new(
        RelaySettings::type_descriptor(),
        "mail",
    );
    let definition = registry.register(explicit).unwrap();
    assert_eq!(definition.configuration_type().prefix(), "mail");
}

#[test]
fn builder_reports_unmarked_configuration_types() {
    let result = ContainerBuilder::new()
        .configuration::<RelaySettings>()
        .build();
    assert!(matches!(result, Err(IgnitionError::NoBindStrategy { .. })));
}
