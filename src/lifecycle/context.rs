use super::Result;
use crate::event::{ApplicationEvent, ApplicationListener};
use std::fmt;
use std::sync::Arc;

/// The container-side view used by the lifecycle.
///
/// Once the container is loaded it owns its own multicaster; events from
/// then on are published through it rather than through the lifecycle's
/// internal bus.
pub trait ApplicationContext: Send + Sync + fmt::Debug {
    fn add_application_listener(&self, listener: Arc<dyn ApplicationListener>);

    /// Publish through the container's multicaster.
    ///
    /// Fails with [`LifecycleError::MulticasterUnavailable`](super::LifecycleError::MulticasterUnavailable)
    /// before the container has been refreshed.
    fn publish_event(&self, event: &dyn ApplicationEvent) -> Result<()>;

    /// Whether the container is refreshed and not yet closed.
    fn is_active(&self) -> bool;

    /// Listeners known to the container so far.
    fn application_listeners(&self) -> Vec<Arc<dyn ApplicationListener>>;
}
