//! Application Bootstrap
//!
//! Runs the full startup sequence: environment, container, configuration
//! binding and runners, announcing each milestone through a
//! [`LifecycleOrchestrator`].

use super::{
    ApplicationArguments, ApplicationContext, ApplicationRunner, LifecycleError,
    LifecycleOrchestrator, Result,
};
use crate::config::Environment;
use crate::di::{Container, ContainerBuilder};
use crate::event::ApplicationListener;
use crate::properties::{CommandLinePropertySource, ConfigurationType, Introspect, PropertySource};
use std::sync::Arc;

/// A started application
///
/// # Example
///
/// ```rust,ignore
/// use ignition::lifecycle::Application;
///
/// #[tokio::main]
/// async fn main() {
///     let app = Application::builder("orders")
///         .args(std::env::args().skip(1))
///         .configuration::<ServerProperties>()
///         .listener(Arc::new(StartupLogger))
///         .run()
///         .await
///         .expect("Failed to start application");
///
///     let server = app.container().configuration::<ServerProperties>().unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct Application {
    name: String,
    container: Arc<Container>,
    arguments: ApplicationArguments,
}

impl Application {
    /// Create a new application builder
    pub fn builder(name: impl Into<String>) -> ApplicationBuilder {
        ApplicationBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a reference to the container
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn arguments(&self) -> &ApplicationArguments {
        &self.arguments
    }

    pub fn environment(&self) -> &Environment {
        self.container.environment()
    }
}

/// Builder for Application
pub struct ApplicationBuilder {
    name: String,
    args: Vec<String>,
    listeners: Vec<Arc<dyn ApplicationListener>>,
    property_sources: Vec<Arc<dyn PropertySource>>,
    configurations: Vec<crate::error::Result<ConfigurationType>>,
    runners: Vec<Arc<dyn ApplicationRunner>>,
}

impl ApplicationBuilder {
    /// Create a new application builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            listeners: Vec::new(),
            property_sources: Vec::new(),
            configurations: Vec::new(),
            runners: Vec::new(),
        }
    }

    /// Command-line arguments, without the program name
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Listener known from the very first event
    pub fn listener(mut self, listener: Arc<dyn ApplicationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Property source ranked below the command line and earlier sources
    pub fn property_source(mut self, source: Arc<dyn PropertySource>) -> Self {
        self.property_sources.push(source);
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

    /// Runner called after the container is started, in registration order
    pub fn runner(mut self, runner: Arc<dyn ApplicationRunner>) -> Self {
        self.runners.push(runner);
        self
    }

    /// Run the startup sequence
    ///
    /// # Errors
    ///
    /// Any failure is first reported through the failed event and then
    /// returned as [`LifecycleError::Startup`].
    pub async fn run(self) -> Result<Application> {
        let ApplicationBuilder {
            name,
            args,
            listeners,
            property_sources,
            configurations,
            runners,
        } = self;
        let orchestrator = LifecycleOrchestrator::new(name.clone(), listeners);
        let arguments = ApplicationArguments::new(args);
        let mut context: Option<Arc<dyn ApplicationContext>> = None;

        tracing::info!(application = %name, "Starting application...");

        let outcome = start(
            &orchestrator,
            &arguments,
            property_sources,
            configurations,
            &runners,
            &mut context,
        )
        .await;

        match outcome {
            Ok(container) => {
                tracing::info!(application = %name, "Application started");
                Ok(Application {
                    name,
                    container,
                    arguments,
                })
            }
            Err(error) => {
                let cause = Arc::new(anyhow::Error::new(error));
                tracing::error!(application = %name, error = %cause, "Application run failed");
                if let Err(report) = orchestrator.failed(context.as_ref(), cause.clone()) {
                    tracing::warn!(error = %report, "could not publish the failed event");
                }
                Err(LifecycleError::Startup(cause))
            }
        }
    }
}

async fn start(
    orchestrator: &LifecycleOrchestrator,
    arguments: &ApplicationArguments,
    property_sources: Vec<Arc<dyn PropertySource>>,
    configurations: Vec<crate::error::Result<ConfigurationType>>,
    runners: &[Arc<dyn ApplicationRunner>],
    context: &mut Option<Arc<dyn ApplicationContext>>,
) -> Result<Arc<Container>> {
    orchestrator.starting()?;

    let environment = Environment::new();
    let command_line = CommandLinePropertySource::new(arguments.source_args());
    if !command_line.is_empty() {
        environment.add_first(Arc::new(command_line));
    }
    for source in property_sources {
        environment.add_last(source);
    }
    orchestrator.environment_prepared(&environment)?;

    let container = Arc::new(
        configurations
            .into_iter()
            .try_fold(ContainerBuilder::new().environment(environment), |builder, ty| {
                ty.map(|ty| builder.configuration_type(ty))
            })?
            .build()?,
    );
    let shared: Arc<dyn ApplicationContext> = container.clone();
    *context = Some(shared.clone());

    orchestrator.context_initialized(&shared)?;
    orchestrator.context_loaded(&shared)?;
    container.refresh()?;
    orchestrator.started(&shared)?;

    for runner in runners {
        tracing::debug!(runner = runner.name(), "calling application runner");
        runner
            .run(&container, arguments)
            .await
            .map_err(|source| LifecycleError::runner_failed(runner.name(), source))?;
    }

    orchestrator.ready(&shared)?;
    Ok(container)
}
