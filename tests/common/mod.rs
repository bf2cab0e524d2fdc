//! Shared helpers for the integration tests.

use ignition::event::{ApplicationEvent, ApplicationListener};
use ignition::lifecycle::LifecyclePhase;
use std::sync::{Arc, Mutex};

/// Install a test-friendly subscriber once per test binary.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Shared, ordered record of `listener:EVENT` deliveries.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

#[allow(dead_code)]
pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

fn label(event: &dyn ApplicationEvent) -> String {
    match event.phase() {
        Some(phase) => phase.to_string(),
        None => "OTHER".to_string(),
    }
}

/// Records every supported event; optionally restricted to one phase.
pub struct RecordingListener {
    name: String,
    only: Option<LifecyclePhase>,
    fail: bool,
    journal: Journal,
}

impl RecordingListener {
    pub fn new(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            only: None,
            fail: false,
            journal: journal.clone(),
        })
    }

    #[allow(dead_code)]
    pub fn only(name: &str, phase: LifecyclePhase, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            only: Some(phase),
            fail: false,
            journal: journal.clone(),
        })
    }

    /// Records the event, then returns an error.
    #[allow(dead_code)]
    pub fn failing(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            only: None,
            fail: true,
            journal: journal.clone(),
        })
    }
}

impl ApplicationListener for RecordingListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_event(&self, event: &dyn ApplicationEvent) -> bool {
        match self.only {
            Some(phase) => event.phase() == Some(phase),
            None => true,
        }
    }

    fn on_application_event(&self, event: &dyn ApplicationEvent) -> anyhow::Result<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, label(event)));
        if self.fail {
            anyhow::bail!("{} failed on purpose", self.name);
        }
        Ok(())
    }
}
