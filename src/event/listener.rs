use super::events::ApplicationEvent;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// Observer of application events.
pub trait ApplicationListener: Send + Sync {
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Lower values are delivered first. Equal values keep registration order.
    fn order(&self) -> i32 {
        0
    }

    /// Whether this listener wants `event` at all.
    fn supports_event(&self, _event: &dyn ApplicationEvent) -> bool {
        true
    }

    fn on_application_event(&self, event: &dyn ApplicationEvent) -> anyhow::Result<()>;
}

/// A listener interested in a single concrete event type.
pub struct TypedListener<E, F> {
    name: String,
    order: i32,
    handler: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> TypedListener<E, F>
where
    E: ApplicationEvent,
    F: Fn(&E) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            order: 0,
            handler,
            _event: PhantomData,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl<E, F> ApplicationListener for TypedListener<E, F>
where
    E: ApplicationEvent,
    F: Fn(&E) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn supports_event(&self, event: &dyn ApplicationEvent) -> bool {
        event.is::<E>()
    }

    fn on_application_event(&self, event: &dyn ApplicationEvent) -> anyhow::Result<()> {
        match event.downcast_ref::<E>() {
            Some(event) => (self.handler)(event),
            None => Ok(()),
        }
    }
}

impl<E, F> fmt::Debug for TypedListener<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedListener")
            .field("name", &self.name)
            .field("event", &type_name::<E>())
            .field("order", &self.order)
            .finish()
    }
}

/// Shorthand for [`TypedListener::new`].
///
/// ```
/// use ignition::event::{ApplicationReadyEvent, listener};
///
/// let on_ready = listener::<ApplicationReadyEvent, _>("on-ready", |event| {
///     tracing::info!(source = %event.metadata.source, "ready");
///     Ok(())
/// });
/// ```
pub fn listener<E, F>(name: impl Into<String>, handler: F) -> TypedListener<E, F>
where
    E: ApplicationEvent,
    F: Fn(&E) -> anyhow::Result<()> + Send + Sync,
{
    TypedListener::new(name, handler)
}
