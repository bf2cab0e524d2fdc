//! Startup Lifecycle Module
//!
//! This module drives the fixed startup sequence and announces each phase
//! to application listeners.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. STARTING                 ← internal bus
//!    ↓
//! 2. ENVIRONMENT_PREPARED     ← internal bus
//!    ↓
//! 3. CONTEXT_INITIALIZED      ← internal bus
//!    ↓
//! 4. CONTEXT_LOADED           ← listeners handed to the container
//!    ↓
//!    Container refresh (configuration beans bound)
//!    ↓
//! 5. STARTED                  ← container multicaster
//!    ↓
//!    Application runners
//!    ↓
//! 6. READY                    ← container multicaster
//!
//! FAILED may follow any phase.
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ignition::event::{ApplicationReadyEvent, listener};
//! use ignition::lifecycle::Application;
//! use std::sync::Arc;
//!
//! let app = Application::builder("billing")
//!     .listener(Arc::new(listener::<ApplicationReadyEvent, _>("ready", |_| {
//!         tracing::info!("accepting traffic");
//!         Ok(())
//!     })))
//!     .run()
//!     .await?;
//! ```

mod application;
mod arguments;
mod context;
mod error;
mod orchestrator;
mod phase;
mod traits;

pub use application::{Application, ApplicationBuilder};
pub use arguments::ApplicationArguments;
pub use context::ApplicationContext;
pub use error::{LifecycleError, Result};
pub use orchestrator::{DeliveryOwner, LifecycleOrchestrator};
pub use phase::LifecyclePhase;
pub use traits::ApplicationRunner;
