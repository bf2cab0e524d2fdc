//! Application events and the multicaster that delivers them.
//!
//! Every startup milestone is announced as an [`ApplicationEvent`].
//! Listeners register on a [`PhaseEventBus`] and are called synchronously,
//! ordered by [`ApplicationListener::order`] and then by registration order.
//! A failing listener is reported to the bus's [`ErrorHandler`] and never
//! stops delivery to the others.

mod bus;
mod events;
mod listener;

pub use bus::{ErrorHandler, ListenerDeliveryError, LogAndContinue, LoggingErrorHandler, PhaseEventBus};
pub use events::{
    ApplicationContextInitializedEvent, ApplicationEnvironmentPreparedEvent, ApplicationEvent,
    ApplicationFailedEvent, ApplicationPreparedEvent, ApplicationReadyEvent,
    ApplicationStartedEvent, ApplicationStartingEvent, AvailabilityChangeEvent, AvailabilityState,
    EventMetadata,
};
pub use listener::{ApplicationListener, TypedListener, listener};
