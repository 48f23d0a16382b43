//! Recording Container Factory
//!
//! A [`ContainerFactory`] that creates inert containers and records every
//! lifecycle call instead of consuming messages. Failures can be injected per
//! endpoint id to exercise the registry's error paths.

use crate::listener::component::HandlerRef;
use crate::listener::container::{ContainerFactory, ListenerContainer};
use crate::listener::endpoint::Endpoint;
use crate::listener::error::ContainerError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle call observed by the recording factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Created(String),
    Started(String),
    Stopped(String),
}

#[derive(Debug, Default)]
struct ContainerState {
    started: bool,
    stopped: bool,
    running: bool,
    handler: Option<HandlerRef>,
}

#[derive(Default)]
struct Recorder {
    containers: Vec<RecordedContainer>,
    events: Vec<LifecycleEvent>,
    fail_create: HashSet<String>,
    fail_start: HashSet<String>,
    fail_stop: HashSet<String>,
}

/// Factory recording the containers it creates
#[derive(Clone, Default)]
pub struct RecordingContainerFactory {
    recorder: Arc<Mutex<Recorder>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl RecordingContainerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_container` fail for the endpoint
    pub fn fail_create_for(&self, endpoint_id: &str) {
        lock(&self.recorder).fail_create.insert(endpoint_id.to_string());
    }

    /// Make `start` fail for the endpoint's container
    pub fn fail_start_for(&self, endpoint_id: &str) {
        lock(&self.recorder).fail_start.insert(endpoint_id.to_string());
    }

    /// Make `stop` fail for the endpoint's container
    pub fn fail_stop_for(&self, endpoint_id: &str) {
        lock(&self.recorder).fail_stop.insert(endpoint_id.to_string());
    }

    /// Containers in creation order
    pub fn containers(&self) -> Vec<RecordedContainer> {
        lock(&self.recorder).containers.clone()
    }

    /// Every lifecycle call in the order it happened
    pub fn events(&self) -> Vec<LifecycleEvent> {
        lock(&self.recorder).events.clone()
    }

    /// Endpoint ids of `Stopped` events, in order
    pub fn stop_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                LifecycleEvent::Stopped(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

impl ContainerFactory for RecordingContainerFactory {
    fn create_container(
        &self,
        endpoint: Arc<Endpoint>,
    ) -> Result<Box<dyn ListenerContainer>, ContainerError> {
        let mut recorder = lock(&self.recorder);
        if recorder.fail_create.contains(endpoint.id()) {
            return Err(ContainerError::new(format!(
                "refusing to create container for '{}'",
                endpoint.id()
            )));
        }

        let recorded = RecordedContainer {
            endpoint: Arc::clone(&endpoint),
            state: Arc::new(Mutex::new(ContainerState::default())),
        };
        recorder.containers.push(recorded.clone());
        recorder
            .events
            .push(LifecycleEvent::Created(endpoint.id().to_string()));

        Ok(Box::new(RecordingContainer {
            recorded,
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

/// Observer handle on a container created by [`RecordingContainerFactory`]
#[derive(Clone)]
pub struct RecordedContainer {
    endpoint: Arc<Endpoint>,
    state: Arc<Mutex<ContainerState>>,
}

impl RecordedContainer {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Whether `start` was ever called successfully
    pub fn is_started(&self) -> bool {
        lock(&self.state).started
    }

    /// Whether `stop` was called successfully after a start
    pub fn is_stopped(&self) -> bool {
        lock(&self.state).stopped
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    /// Handler bound by the registry, if any
    pub fn handler(&self) -> Option<HandlerRef> {
        lock(&self.state).handler.clone()
    }
}

struct RecordingContainer {
    recorded: RecordedContainer,
    recorder: Arc<Mutex<Recorder>>,
}

impl ListenerContainer for RecordingContainer {
    fn endpoint(&self) -> &Endpoint {
        &self.recorded.endpoint
    }

    fn set_message_handler(&mut self, handler: HandlerRef) {
        lock(&self.recorded.state).handler = Some(handler);
    }

    fn start(&mut self) -> Result<(), ContainerError> {
        let id = self.recorded.endpoint.id().to_string();
        let mut recorder = lock(&self.recorder);
        if recorder.fail_start.contains(&id) {
            return Err(ContainerError::new(format!("injected start failure for '{}'", id)));
        }

        let mut state = lock(&self.recorded.state);
        state.started = true;
        state.running = true;
        recorder.events.push(LifecycleEvent::Started(id));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ContainerError> {
        let id = self.recorded.endpoint.id().to_string();
        let mut recorder = lock(&self.recorder);
        recorder.events.push(LifecycleEvent::Stopped(id.clone()));
        if recorder.fail_stop.contains(&id) {
            return Err(ContainerError::new(format!("injected stop failure for '{}'", id)));
        }

        let mut state = lock(&self.recorded.state);
        if state.running {
            state.stopped = true;
        }
        state.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        lock(&self.recorded.state).running
    }
}
