//! Synchronous, ordered event multicaster.

use super::events::ApplicationEvent;
use super::listener::ApplicationListener;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// A listener failed while handling an event.
#[derive(Debug, Error)]
#[error("listener '{listener}' failed to handle {event}: {source}")]
pub struct ListenerDeliveryError {
    pub listener: String,
    pub event: String,
    #[source]
    pub source: anyhow::Error,
}

/// Decides what happens to a listener failure. Delivery always continues.
pub trait ErrorHandler: Send + Sync {
    fn handle_error(&self, error: &ListenerDeliveryError);
}

/// Default handler: log the failure and carry on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAndContinue;

impl ErrorHandler for LogAndContinue {
    fn handle_error(&self, error: &ListenerDeliveryError) {
        tracing::error!(
            listener = %error.listener,
            event = %error.event,
            error = %error.source,
            "listener failed during event delivery"
        );
    }
}

/// Handler installed on the fallback bus while reporting a startup failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn handle_error(&self, error: &ListenerDeliveryError) {
        tracing::warn!(
            listener = %error.listener,
            error = ?error.source,
            "Error calling ApplicationEventListener"
        );
    }
}

/// Delivers each event, in order, to every listener that supports it.
///
/// Delivery works on a snapshot taken when `publish` starts, so listeners
/// added while an event is in flight only see later events.
pub struct PhaseEventBus {
    listeners: RwLock<Vec<Arc<dyn ApplicationListener>>>,
    error_handler: RwLock<Arc<dyn ErrorHandler>>,
}

impl PhaseEventBus {
    pub fn new() -> Self {
        Self::with_error_handler(Arc::new(LogAndContinue))
    }

    pub fn with_error_handler(error_handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            error_handler: RwLock::new(error_handler),
        }
    }

    /// Add `listener`. Returns `false` if this same instance is already registered.
    pub fn register(&self, listener: Arc<dyn ApplicationListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if listeners.iter().any(|known| same_listener(known, &listener)) {
            tracing::trace!(listener = listener.name(), "listener already registered");
            return false;
        }
        listeners.push(listener);
        true
    }

    pub fn set_error_handler(&self, error_handler: Arc<dyn ErrorHandler>) {
        *self
            .error_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = error_handler;
    }

    pub fn listeners(&self) -> Vec<Arc<dyn ApplicationListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` and return how many listeners received it.
    pub fn publish(&self, event: &dyn ApplicationEvent) -> usize {
        let mut snapshot = self.listeners();
        snapshot.sort_by_key(|listener| listener.order());
        let error_handler = self
            .error_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut delivered = 0;
        for listener in snapshot
            .iter()
            .filter(|listener| listener.supports_event(event))
        {
            delivered += 1;
            if let Err(source) = listener.on_application_event(event) {
                error_handler.handle_error(&ListenerDeliveryError {
                    listener: listener.name().to_string(),
                    event: event_name(event),
                    source,
                });
            }
        }
        tracing::trace!(event = %event_name(event), delivered, "event published");
        delivered
    }
}

impl Default for PhaseEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhaseEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseEventBus")
            .field("listeners", &self.len())
            .finish_non_exhaustive()
    }
}

fn same_listener(a: &Arc<dyn ApplicationListener>, b: &Arc<dyn ApplicationListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn event_name(event: &dyn ApplicationEvent) -> String {
    match event.phase() {
        Some(phase) => phase.to_string(),
        None => format!("{event:?}")
            .split([' ', '{', '('])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
