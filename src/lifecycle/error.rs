//! Lifecycle-specific error types

use crate::error::IgnitionError;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while driving the startup lifecycle
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A phase was announced out of order
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current phase, or `NONE` before `STARTING`
        from: String,
        /// Requested phase
        to: String,
    },

    /// The container was asked to publish before its multicaster exists
    #[error("The application event multicaster is not initialized")]
    MulticasterUnavailable,

    /// Configuration binding failed
    #[error(transparent)]
    Configuration(#[from] IgnitionError),

    /// An application runner returned an error
    #[error("Application runner '{runner}' failed: {source}")]
    RunnerFailed {
        /// Name of the runner
        runner: String,
        /// Error returned by the runner
        #[source]
        source: anyhow::Error,
    },

    /// Startup failed; listeners have been told through a failed event
    #[error("Application startup failed: {0}")]
    Startup(Arc<anyhow::Error>),
}

impl LifecycleError {
    /// Create an invalid transition error
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a runner failure error
    pub fn runner_failed(runner: impl Into<String>, source: anyhow::Error) -> Self {
        Self::RunnerFailed {
            runner: runner.into(),
            source,
        }
    }

    /// The startup failure cause, if this is a [`LifecycleError::Startup`]
    pub fn startup_cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Startup(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
