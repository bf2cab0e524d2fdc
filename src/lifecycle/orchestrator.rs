//! Phase-by-phase publication of startup events.

use super::{ApplicationContext, LifecycleError, LifecyclePhase, Result};
use crate::config::Environment;
use crate::event::{
    ApplicationContextInitializedEvent, ApplicationEnvironmentPreparedEvent, ApplicationEvent,
    ApplicationFailedEvent, ApplicationListener, ApplicationPreparedEvent, ApplicationReadyEvent,
    ApplicationStartedEvent, ApplicationStartingEvent, AvailabilityChangeEvent,
    AvailabilityState, LoggingErrorHandler, PhaseEventBus,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Who delivers events right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOwner {
    /// The orchestrator's own bus, seeded with the initial listeners.
    Internal,
    /// The container's multicaster, from `context_loaded` onward.
    Context,
}

#[derive(Debug)]
struct State {
    phase: Option<LifecyclePhase>,
    owner: DeliveryOwner,
}

/// Drives the startup event sequence.
///
/// Each phase method is called once, in order, by the bootstrap code.
/// Until `context_loaded` events go through an internal [`PhaseEventBus`];
/// at `context_loaded` every known listener is handed to the container,
/// which delivers `started` and `ready`. `failed` may be called from any
/// phase and falls back to the internal bus when the container is not active.
pub struct LifecycleOrchestrator {
    source: String,
    listeners: Vec<Arc<dyn ApplicationListener>>,
    bus: PhaseEventBus,
    state: Mutex<State>,
}

impl LifecycleOrchestrator {
    pub fn new(source: impl Into<String>, listeners: Vec<Arc<dyn ApplicationListener>>) -> Self {
        let bus = PhaseEventBus::new();
        for listener in &listeners {
            bus.register(listener.clone());
        }
        Self {
            source: source.into(),
            listeners,
            bus,
            state: Mutex::new(State {
                phase: None,
                owner: DeliveryOwner::Internal,
            }),
        }
    }

    pub fn phase(&self) -> Option<LifecyclePhase> {
        self.state().phase
    }

    pub fn delivery_owner(&self) -> DeliveryOwner {
        self.state().owner
    }

    pub fn listeners(&self) -> &[Arc<dyn ApplicationListener>] {
        &self.listeners
    }

    pub fn starting(&self) -> Result<()> {
        self.advance(LifecyclePhase::Starting)?;
        self.publish_internal(&ApplicationStartingEvent::new(&self.source));
        Ok(())
    }

    pub fn environment_prepared(&self, environment: &Environment) -> Result<()> {
        self.advance(LifecyclePhase::EnvironmentPrepared)?;
        self.publish_internal(&ApplicationEnvironmentPreparedEvent::new(
            &self.source,
            environment.clone(),
        ));
        Ok(())
    }

    pub fn context_initialized(&self, context: &Arc<dyn ApplicationContext>) -> Result<()> {
        self.advance(LifecyclePhase::ContextInitialized)?;
        self.publish_internal(&ApplicationContextInitializedEvent::new(
            &self.source,
            context.clone(),
        ));
        Ok(())
    }

    /// Hand every known listener to the container and announce it prepared.
    pub fn context_loaded(&self, context: &Arc<dyn ApplicationContext>) -> Result<()> {
        self.advance(LifecyclePhase::ContextLoaded)?;
        for listener in &self.listeners {
            context.add_application_listener(listener.clone());
        }
        self.publish_internal(&ApplicationPreparedEvent::new(&self.source, context.clone()));
        self.state().owner = DeliveryOwner::Context;
        tracing::debug!("event delivery handed over to the application context");
        Ok(())
    }

    pub fn started(&self, context: &Arc<dyn ApplicationContext>) -> Result<()> {
        self.advance(LifecyclePhase::Started)?;
        context.publish_event(&ApplicationStartedEvent::new(&self.source, context.clone()))?;
        context.publish_event(&AvailabilityChangeEvent::new(
            &self.source,
            AvailabilityState::Correct,
        ))
    }

    pub fn ready(&self, context: &Arc<dyn ApplicationContext>) -> Result<()> {
        self.advance(LifecyclePhase::Ready)?;
        context.publish_event(&ApplicationReadyEvent::new(&self.source, context.clone()))?;
        context.publish_event(&AvailabilityChangeEvent::new(
            &self.source,
            AvailabilityState::AcceptingTraffic,
        ))
    }

    /// Report a startup failure to every listener known so far.
    pub fn failed(
        &self,
        context: Option<&Arc<dyn ApplicationContext>>,
        cause: Arc<anyhow::Error>,
    ) -> Result<()> {
        self.advance(LifecyclePhase::Failed)?;
        let event = ApplicationFailedEvent::new(&self.source, context.cloned(), cause);

        if let Some(context) = context.filter(|context| context.is_active()) {
            if context.publish_event(&event).is_ok() {
                return Ok(());
            }
            tracing::warn!("active context could not publish the failure, using the fallback bus");
        }

        if let Some(context) = context {
            for listener in context.application_listeners() {
                self.bus.register(listener);
            }
        }
        self.bus.set_error_handler(Arc::new(LoggingErrorHandler));
        self.bus.publish(&event);
        Ok(())
    }

    fn advance(&self, next: LifecyclePhase) -> Result<()> {
        let mut state = self.state();
        if !next.can_follow(state.phase) {
            let from = state
                .phase
                .map(|phase| phase.to_string())
                .unwrap_or_else(|| "NONE".to_string());
            return Err(LifecycleError::invalid_transition(from, next.to_string()));
        }
        state.phase = Some(next);
        tracing::info!(phase = %next, source = %self.source, "lifecycle phase");
        Ok(())
    }

    fn publish_internal(&self, event: &dyn ApplicationEvent) {
        self.bus.publish(event);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for LifecycleOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("LifecycleOrchestrator")
            .field("source", &self.source)
            .field("listeners", &self.listeners.len())
            .field("phase", &state.phase)
            .field("owner", &state.owner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::listener;

    #[test]
    fn out_of_order_phases_are_rejected() {
        let orchestrator = LifecycleOrchestrator::new("test", Vec::new());
        assert!(matches!(
            orchestrator.environment_prepared(&Environment::new()),
            Err(LifecycleError::InvalidTransition { .. })
        ));
        orchestrator.starting().unwrap();
        assert!(orchestrator.starting().is_err());
        assert_eq!(orchestrator.phase(), Some(LifecyclePhase::Starting));
    }

    #[test]
    fn failed_is_terminal() {
        let orchestrator = LifecycleOrchestrator::new("test", Vec::new());
        orchestrator
            .failed(None, Arc::new(anyhow::anyhow!("boom")))
            .unwrap();
        assert!(orchestrator.failed(None, Arc::new(anyhow::anyhow!("again"))).is_err());
        assert!(orchestrator.starting().is_err());
    }

    #[test]
    fn initial_listeners_are_registered_once() {
        let shared: Arc<dyn ApplicationListener> =
            Arc::new(listener::<ApplicationStartingEvent, _>("starting", |_| Ok(())));
        let orchestrator = LifecycleOrchestrator::new("test", vec![shared.clone(), shared]);
        assert_eq!(orchestrator.bus.len(), 1);
        assert_eq!(orchestrator.delivery_owner(), DeliveryOwner::Internal);
    }
}
