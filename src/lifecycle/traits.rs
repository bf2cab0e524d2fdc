//! Application runner trait
//!
//! Runners participate in startup after the container is refreshed and
//! before the application is announced ready.

use super::ApplicationArguments;
use crate::di::Container;
use async_trait::async_trait;

/// Called once the container is refreshed and the started event is out
///
/// Use this hook to:
/// - Read bound configuration beans
/// - Seed caches or perform warm-up work
/// - Validate the environment before traffic is accepted
///
/// Runners are called in registration order. An error aborts startup and is
/// reported through the failed event.
///
/// # Example
///
/// ```rust,ignore
/// use ignition::lifecycle::{ApplicationArguments, ApplicationRunner};
/// use ignition::Container;
/// use async_trait::async_trait;
///
/// struct PrintPort;
///
/// #[async_trait]
/// impl ApplicationRunner for PrintPort {
///     async fn run(&self, container: &Container, _args: &ApplicationArguments) -> anyhow::Result<()> {
///         let server = container.configuration::<ServerProperties>()?;
///         tracing::info!(port = server.port, "configured");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ApplicationRunner: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once during startup
    async fn run(&self, container: &Container, args: &ApplicationArguments) -> anyhow::Result<()>;
}
