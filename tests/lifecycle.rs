//! Phase ordering, delivery ownership and degraded failure reporting.

use common::{Journal, RecordingListener, entries, journal};
use ignition::event::ApplicationListener;
use ignition::lifecycle::{
    ApplicationContext, DeliveryOwner, LifecycleError, LifecycleOrchestrator, LifecyclePhase,
};
use ignition::{Container, Environment};
use std::sync::Arc;

mod common;

fn orchestrator(listeners: Vec<Arc<RecordingListener>>) -> LifecycleOrchestrator {
    LifecycleOrchestrator::new(
        "lifecycle-test",
        listeners
            .into_iter()
            .map(|listener| listener as Arc<dyn ApplicationListener>)
            .collect(),
    )
}

fn cause(message: &str) -> Arc<anyhow::Error> {
    Arc::new(anyhow::anyhow!(message.to_string()))
}

fn run_to_ready(orchestrator: &LifecycleOrchestrator) -> Arc<Container> {
    let container = Arc::new(Container::new());
    let context: Arc<dyn ApplicationContext> = container.clone();
    orchestrator.starting().unwrap();
    orchestrator
        .environment_prepared(container.environment())
        .unwrap();
    orchestrator.context_initialized(&context).unwrap();
    orchestrator.context_loaded(&context).unwrap();
    container.refresh().unwrap();
    orchestrator.started(&context).unwrap();
    orchestrator.ready(&context).unwrap();
    container
}

fn phases_only(journal: &Journal) -> Vec<String> {
    entries(journal)
        .into_iter()
        .filter(|entry| !entry.ends_with(":OTHER"))
        .collect()
}

#[test]
fn failure_before_any_container_reaches_initial_listeners() {
    common::init_tracing();
    let journal = journal();
    let orchestrator = orchestrator(vec![
        RecordingListener::new("first", &journal),
        RecordingListener::new("second", &journal),
    ]);

    orchestrator.starting().unwrap();
    orchestrator.failed(None, cause("no environment")).unwrap();

    assert_eq!(
        entries(&journal),
        vec![
            "first:STARTING",
            "second:STARTING",
            "first:FAILED",
            "second:FAILED"
        ]
    );
    assert_eq!(orchestrator.phase(), Some(LifecyclePhase::Failed));
}

#[test]
fn all_phases_are_delivered_once_in_order() {
    let journal = journal();
    let orchestrator = orchestrator(vec![
        RecordingListener::new("all", &journal),
        RecordingListener::only("ready", LifecyclePhase::Ready, &journal),
    ]);

    run_to_ready(&orchestrator);

    assert_eq!(
        phases_only(&journal),
        vec![
            "all:STARTING",
            "all:ENVIRONMENT_PREPARED",
            "all:CONTEXT_INITIALIZED",
            "all:CONTEXT_LOADED",
            "all:STARTED",
            "all:READY",
            "ready:READY",
        ]
    );
    assert_eq!(
        entries(&journal)
            .iter()
            .filter(|entry| entry.as_str() == "all:OTHER")
            .count(),
        2
    );
}

#[test]
fn failing_listener_does_not_block_the_rest() {
    let journal = journal();
    let orchestrator = orchestrator(vec![
        RecordingListener::failing("broken", &journal),
        RecordingListener::new("healthy", &journal),
    ]);

    orchestrator.starting().unwrap();
    orchestrator
        .environment_prepared(&Environment::new())
        .unwrap();

    assert_eq!(
        entries(&journal),
        vec![
            "broken:STARTING",
            "healthy:STARTING",
            "broken:ENVIRONMENT_PREPARED",
            "healthy:ENVIRONMENT_PREPARED",
        ]
    );
}

#[test]
fn context_owns_delivery_after_context_loaded() {
    let journal = journal();
    let orchestrator = orchestrator(vec![RecordingListener::new("initial", &journal)]);
    let container = Arc::new(Container::new());
    let context: Arc<dyn ApplicationContext> = container.clone();

    orchestrator.starting().unwrap();
    orchestrator
        .environment_prepared(container.environment())
        .unwrap();
    orchestrator.context_initialized(&context).unwrap();
    assert!(container.application_listeners().is_empty());

    orchestrator.context_loaded(&context).unwrap();
    assert_eq!(orchestrator.delivery_owner(), DeliveryOwner::Context);
    assert_eq!(container.application_listeners().len(), 1);

    container.add_application_listener(RecordingListener::only(
        "late",
        LifecyclePhase::Started,
        &journal,
    ));
    container.refresh().unwrap();
    orchestrator.started(&context).unwrap();

    assert!(entries(&journal).contains(&"late:STARTED".to_string()));
    assert!(entries(&journal).contains(&"initial:STARTED".to_string()));
}

#[test]
fn started_needs_a_refreshed_container() {
    let orchestrator = orchestrator(Vec::new());
    let container = Arc::new(Container::new());
    let context: Arc<dyn ApplicationContext> = container.clone();

    orchestrator.starting().unwrap();
    orchestrator
        .environment_prepared(container.environment())
        .unwrap();
    orchestrator.context_initialized(&context).unwrap();
    orchestrator.context_loaded(&context).unwrap();

    assert!(matches!(
        orchestrator.started(&context),
        Err(LifecycleError::MulticasterUnavailable)
    ));
}

#[test]
fn inactive_context_failure_uses_the_fallback_bus_without_duplicates() {
    let journal = journal();
    let orchestrator = orchestrator(vec![RecordingListener::new("initial", &journal)]);
    let container = Arc::new(Container::new());
    let context: Arc<dyn ApplicationContext> = container.clone();

    orchestrator.starting().unwrap();
    orchestrator
        .environment_prepared(container.environment())
        .unwrap();
    orchestrator.context_initialized(&context).unwrap();
    orchestrator.context_loaded(&context).unwrap();
    container.add_application_listener(RecordingListener::new("container-only", &journal));

    orchestrator
        .failed(Some(&context), cause("refresh failed"))
        .unwrap();

    let failures: Vec<_> = entries(&journal)
        .into_iter()
        .filter(|entry| entry.ends_with(":FAILED"))
        .collect();
    assert_eq!(failures, vec!["initial:FAILED", "container-only:FAILED"]);
}

#[test]
fn active_context_failure_is_published_by_the_container() {
    let journal = journal();
    let orchestrator = orchestrator(vec![RecordingListener::new("initial", &journal)]);
    let container = Arc::new(Container::new());
    let context: Arc<dyn ApplicationContext> = container.clone();

    orchestrator.starting().unwrap();
    orchestrator
        .environment_prepared(container.environment())
        .unwrap();
    orchestrator.context_initialized(&context).unwrap();
    orchestrator.context_loaded(&context).unwrap();
    container.refresh().unwrap();
    orchestrator.started(&context).unwrap();
    container.add_application_listener(RecordingListener::only(
        "runner-watch",
        LifecyclePhase::Failed,
        &journal,
    ));

    orchestrator
        .failed(Some(&context), cause("runner failed"))
        .unwrap();

    let failures: Vec<_> = entries(&journal)
        .into_iter()
        .filter(|entry| entry.ends_with(":FAILED"))
        .collect();
    assert_eq!(failures, vec!["initial:FAILED", "runner-watch:FAILED"]);
}
