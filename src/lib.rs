//! # Ignition
//!
//! Startup lifecycle and configuration binding for a dependency injection
//! container.
//!
//! Ignition announces each bootstrap milestone to application listeners and
//! populates strongly typed configuration objects from layered property
//! sources, choosing per type between constructor binding and property
//! binding.
//!
//! ## Features
//!
//! - **Phased lifecycle events**: `STARTING` through `READY`, plus `FAILED`
//!   delivered even when the container never came up
//! - **Configuration properties**: `#[derive(ConfigurationProperties)]` with
//!   prefix, renames, defaults, nested objects and lists
//! - **Two bind strategies**: constructor binding for immutable values,
//!   property binding for default-constructed ones
//! - **Lazy configuration beans**: bound once, on first request or at refresh
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ignition::prelude::*;
//!
//! #[derive(Debug, ConfigurationProperties)]
//! #[config(prefix = "server", constructor_binding)]
//! pub struct ServerProperties {
//!     port: u16,
//!     #[config(default = "localhost")]
//!     host: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), LifecycleError> {
//!     let app = Application::builder("demo")
//!         .args(std::env::args().skip(1))
//!         .property_source(Arc::new(MapPropertySource::new("defaults").with("server.port", 8080)))
//!         .configuration::<ServerProperties>()
//!         .run()
//!         .await?;
//!
//!     let server = app.container().configuration::<ServerProperties>()?;
//!     tracing::info!(port = server.port, "configured");
//!     Ok(())
//! }
//! ```

extern crate self as ignition;

pub mod config;
pub mod di;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod properties;

// Re-export core types
pub use config::Environment;
pub use di::{Container, ContainerBuilder};
pub use error::{IgnitionError, Result};
pub use event::{ApplicationEvent, ApplicationListener, PhaseEventBus};
pub use lifecycle::{Application, ApplicationBuilder, LifecycleError, LifecycleOrchestrator};
pub use properties::{
    BindStrategy, BindStrategyResolver, ConfigBeanRegistry, ConfigBinder, MapPropertySource,
    PropertySource,
};

// Re-export macros
pub use ignition_macro::ConfigurationProperties;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
#[doc(hidden)]
pub use strum;

/// Prelude module for convenient imports
///
/// ```
/// use ignition::prelude::*;
/// ```
pub mod prelude {
    pub use crate::ConfigurationProperties;
    pub use crate::bindable_enum;
    pub use crate::config::Environment;
    pub use crate::di::{Container, ContainerBuilder};
    pub use crate::error::{IgnitionError, Result};
    pub use crate::event::{
        ApplicationEvent, ApplicationFailedEvent, ApplicationListener, ApplicationReadyEvent,
        ApplicationStartedEvent, ApplicationStartingEvent, PhaseEventBus, listener,
    };
    pub use crate::lifecycle::{
        Application, ApplicationArguments, ApplicationBuilder, ApplicationContext,
        ApplicationRunner, LifecycleError, LifecycleOrchestrator, LifecyclePhase,
    };
    pub use crate::properties::{
        BindStrategy, BindStrategyResolver, Bindable, CommandLinePropertySource,
        ConfigBeanRegistry, ConfigBinder, ConfigurationType, Introspect, MapPropertySource,
        PropertySource, TypeCatalog,
    };
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
