//! Events announcing startup milestones.

use crate::config::Environment;
use crate::lifecycle::{ApplicationContext, LifecyclePhase};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use strum_macros::Display;
use uuid::Uuid;

/// Identity, time and origin of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMetadata {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Name of the application that published the event.
    pub source: String,
}

impl EventMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }
}

/// An event delivered through a [`PhaseEventBus`](super::PhaseEventBus).
pub trait ApplicationEvent: Any + Send + Sync + fmt::Debug + 'static {
    fn metadata(&self) -> &EventMetadata;

    /// Lifecycle phase announced by this event, if any.
    fn phase(&self) -> Option<LifecyclePhase> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn ApplicationEvent {
    /// The concrete event, if it is an `E`.
    pub fn downcast_ref<E: ApplicationEvent>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    pub fn is<E: ApplicationEvent>(&self) -> bool {
        self.as_any().is::<E>()
    }
}

macro_rules! phase_event {
    ($event:ident, $phase:expr) => {
        impl ApplicationEvent for $event {
            fn metadata(&self) -> &EventMetadata {
                &self.metadata
            }

            fn phase(&self) -> Option<LifecyclePhase> {
                Some($phase)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

/// Published as early as possible, before the environment exists.
#[derive(Debug, Clone)]
pub struct ApplicationStartingEvent {
    pub metadata: EventMetadata,
}

impl ApplicationStartingEvent {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            metadata: EventMetadata::new(source),
        }
    }
}

phase_event!(ApplicationStartingEvent, LifecyclePhase::Starting);

/// Published once the environment is available for inspection.
#[derive(Debug, Clone)]
pub struct ApplicationEnvironmentPreparedEvent {
    pub metadata: EventMetadata,
    pub environment: Environment,
}

impl ApplicationEnvironmentPreparedEvent {
    pub fn new(source: impl Into<String>, environment: Environment) -> Self {
        Self {
            metadata: EventMetadata::new(source),
            environment,
        }
    }
}

phase_event!(
    ApplicationEnvironmentPreparedEvent,
    LifecyclePhase::EnvironmentPrepared
);

macro_rules! context_event {
    ($(#[$doc:meta])* $event:ident, $phase:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $event {
            pub metadata: EventMetadata,
            pub context: Arc<dyn ApplicationContext>,
        }

        impl $event {
            pub fn new(source: impl Into<String>, context: Arc<dyn ApplicationContext>) -> Self {
                Self {
                    metadata: EventMetadata::new(source),
                    context,
                }
            }
        }

        phase_event!($event, $phase);
    };
}

context_event!(
    /// Published once the container exists, before any definitions are loaded.
    ApplicationContextInitializedEvent,
    LifecyclePhase::ContextInitialized
);

context_event!(
    /// Published when the container is prepared but not yet refreshed.
    ApplicationPreparedEvent,
    LifecyclePhase::ContextLoaded
);

context_event!(
    /// Published after refresh, before application runners are called.
    ApplicationStartedEvent,
    LifecyclePhase::Started
);

context_event!(
    /// Published once every runner has completed.
    ApplicationReadyEvent,
    LifecyclePhase::Ready
);

/// Published when startup fails.
#[derive(Debug, Clone)]
pub struct ApplicationFailedEvent {
    pub metadata: EventMetadata,
    pub context: Option<Arc<dyn ApplicationContext>>,
    pub cause: Arc<anyhow::Error>,
}

impl ApplicationFailedEvent {
    pub fn new(
        source: impl Into<String>,
        context: Option<Arc<dyn ApplicationContext>>,
        cause: Arc<anyhow::Error>,
    ) -> Self {
        Self {
            metadata: EventMetadata::new(source),
            context,
            cause,
        }
    }
}

phase_event!(ApplicationFailedEvent, LifecyclePhase::Failed);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityState {
    /// Liveness: the application is running and its internal state is valid.
    Correct,
    /// Liveness: the application cannot recover.
    Broken,
    /// Readiness: the application accepts traffic.
    AcceptingTraffic,
    /// Readiness: the application refuses traffic.
    RefusingTraffic,
}

impl AvailabilityState {
    pub fn is_liveness(self) -> bool {
        matches!(self, Self::Correct | Self::Broken)
    }
}

/// Published after `started` (liveness) and after `ready` (readiness).
#[derive(Debug, Clone)]
pub struct AvailabilityChangeEvent {
    pub metadata: EventMetadata,
    pub state: AvailabilityState,
}

impl AvailabilityChangeEvent {
    pub fn new(source: impl Into<String>, state: AvailabilityState) -> Self {
        Self {
            metadata: EventMetadata::new(source),
            state,
        }
    }
}

impl ApplicationEvent for AvailabilityChangeEvent {
    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
