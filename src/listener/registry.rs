//! Endpoint Registry
//!
//! Central table of registered endpoints and the containers built for them.
//! The registry moves through `Collecting -> Started -> Stopped` exactly once:
//! endpoints are registered while collecting, `start()` creates and starts one
//! container per endpoint in registration order, and `stop()` stops them in
//! reverse order.
//!
//! `start()` and `stop()` take `&mut self`; callers sharing a registry across
//! threads must serialize them (the host lifecycle does).

use crate::listener::container::{ContainerFactory, ListenerContainer};
use crate::listener::declaration::DEFAULT_CONTAINER_FACTORY;
use crate::listener::endpoint::Endpoint;
use crate::listener::error::{ListenerError, ListenerResult, StopFailure};
use std::collections::HashMap;
use std::sync::Arc;

/// Lifecycle state of an [`EndpointRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RegistryState {
    Collecting,
    Started,
    Stopped,
}

struct Registration {
    endpoint: Arc<Endpoint>,
    factory_name: Option<String>,
}

/// Registry owning endpoints, container factories and containers
pub struct EndpointRegistry {
    state: RegistryState,
    registrations: Vec<Registration>,
    factories: HashMap<String, Arc<dyn ContainerFactory>>,
    default_factory: String,
    auto_startup: bool,
    containers: Vec<Box<dyn ListenerContainer>>,
}

impl std::fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointRegistry")
            .field("state", &self.state)
            .field("endpoints", &self.endpoint_ids())
            .field("factories", &self.factory_names())
            .field("default_factory", &self.default_factory)
            .field("containers", &self.container_ids())
            .finish()
    }
}

impl EndpointRegistry {
    /// Empty registry using [`DEFAULT_CONTAINER_FACTORY`] as default factory
    pub fn new() -> Self {
        Self {
            state: RegistryState::Collecting,
            registrations: Vec::new(),
            factories: HashMap::new(),
            default_factory: DEFAULT_CONTAINER_FACTORY.to_string(),
            auto_startup: true,
            containers: Vec::new(),
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    fn ensure_collecting(&self, operation: &str) -> ListenerResult<()> {
        if self.state != RegistryState::Collecting {
            return Err(ListenerError::configuration(format!(
                "Cannot {} once the endpoint registry is {}",
                operation, self.state
            )));
        }
        Ok(())
    }

    /// Make a container factory available under `name`
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn ContainerFactory>,
    ) -> ListenerResult<()> {
        self.ensure_collecting("register a container factory")?;
        let name = name.into();
        log::debug!("Registered container factory '{}'", name);
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Factory used for endpoints registered without a factory name
    pub fn set_default_factory(&mut self, name: impl Into<String>) -> ListenerResult<()> {
        self.ensure_collecting("change the default container factory")?;
        self.default_factory = name.into();
        Ok(())
    }

    pub fn default_factory(&self) -> &str {
        &self.default_factory
    }

    /// Whether containers start with the registry unless an endpoint says otherwise
    pub fn set_auto_startup(&mut self, auto_startup: bool) -> ListenerResult<()> {
        self.ensure_collecting("change auto-startup")?;
        self.auto_startup = auto_startup;
        Ok(())
    }

    pub fn factory_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// Register an endpoint under a factory name (`None` = default factory)
    pub fn register(
        &mut self,
        endpoint: Endpoint,
        factory_name: Option<&str>,
    ) -> ListenerResult<Arc<Endpoint>> {
        self.ensure_collecting("register an endpoint")?;

        if self.endpoint(endpoint.id()).is_some() {
            return Err(ListenerError::configuration(format!(
                "Another endpoint is already registered with id '{}'",
                endpoint.id()
            )));
        }

        let endpoint = Arc::new(endpoint);
        log::debug!(
            "Registered endpoint '{}' for {} on queues {:?}",
            endpoint.id(),
            endpoint.handler(),
            endpoint.all_queue_names()
        );
        self.registrations.push(Registration {
            endpoint: Arc::clone(&endpoint),
            factory_name: factory_name.map(str::to_string),
        });
        Ok(endpoint)
    }

    /// Create and start one container per endpoint, in registration order
    ///
    /// The first failure is returned; containers started before it keep
    /// running and the registry still counts as started so `stop()` can
    /// clean up.
    pub fn start(&mut self) -> ListenerResult<()> {
        if self.state != RegistryState::Collecting {
            return Err(ListenerError::configuration(format!(
                "Endpoint registry can only be started once (state: {})",
                self.state
            )));
        }
        self.state = RegistryState::Started;
        log::info!(
            "Starting {} listener container(s)",
            self.registrations.len()
        );

        for registration in &self.registrations {
            let endpoint = &registration.endpoint;
            let factory_name = registration
                .factory_name
                .as_deref()
                .unwrap_or(&self.default_factory);

            let factory = self.factories.get(factory_name).ok_or_else(|| {
                ListenerError::configuration(format!(
                    "No container factory named '{}' for endpoint '{}'",
                    factory_name,
                    endpoint.id()
                ))
            })?;

            let mut container = factory
                .create_container(Arc::clone(endpoint))
                .map_err(|source| ListenerError::ContainerStart {
                    endpoint_id: endpoint.id().to_string(),
                    source,
                })?;
            container.set_message_handler(endpoint.handler().clone());

            let auto_startup = endpoint.auto_startup().unwrap_or(self.auto_startup);
            self.containers.push(container);

            if auto_startup {
                if let Some(container) = self.containers.last_mut() {
                    container
                        .start()
                        .map_err(|source| ListenerError::ContainerStart {
                            endpoint_id: endpoint.id().to_string(),
                            source,
                        })?;
                }
                log::debug!("Started container for endpoint '{}'", endpoint.id());
            } else {
                log::debug!(
                    "Container for endpoint '{}' created without auto-startup",
                    endpoint.id()
                );
            }
        }

        log::info!("Started {} listener container(s)", self.running_count());
        Ok(())
    }

    /// Stop every container in reverse registration order
    ///
    /// Every container gets a stop attempt; failures are collected and
    /// returned together. Stopping an already stopped registry is a no-op.
    pub fn stop(&mut self) -> ListenerResult<()> {
        match self.state {
            RegistryState::Collecting => {
                return Err(ListenerError::configuration(
                    "Endpoint registry cannot be stopped before it was started",
                ))
            }
            RegistryState::Stopped => return Ok(()),
            RegistryState::Started => {}
        }
        self.state = RegistryState::Stopped;
        log::info!("Stopping {} listener container(s)", self.containers.len());

        let mut failures = Vec::new();
        for container in self.containers.iter_mut().rev() {
            let endpoint_id = container.endpoint().id().to_string();
            match container.stop() {
                Ok(()) => log::debug!("Stopped container for endpoint '{}'", endpoint_id),
                Err(error) => {
                    log::warn!(
                        "Container for endpoint '{}' failed to stop: {}",
                        endpoint_id,
                        error
                    );
                    failures.push(StopFailure { endpoint_id, error });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ListenerError::ContainerStop { failures })
        }
    }

    /// Registered endpoints in registration order
    pub fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.registrations
            .iter()
            .map(|registration| Arc::clone(&registration.endpoint))
            .collect()
    }

    pub fn endpoint(&self, id: &str) -> Option<Arc<Endpoint>> {
        self.registrations
            .iter()
            .find(|registration| registration.endpoint.id() == id)
            .map(|registration| Arc::clone(&registration.endpoint))
    }

    pub fn endpoint_ids(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|registration| registration.endpoint.id())
            .collect()
    }

    /// Endpoints registered under `factory_name`, in registration order
    pub fn endpoints_for_factory(&self, factory_name: &str) -> Vec<Arc<Endpoint>> {
        self.registrations
            .iter()
            .filter(|registration| {
                registration
                    .factory_name
                    .as_deref()
                    .unwrap_or(&self.default_factory)
                    == factory_name
            })
            .map(|registration| Arc::clone(&registration.endpoint))
            .collect()
    }

    pub fn container(&self, endpoint_id: &str) -> Option<&dyn ListenerContainer> {
        self.containers
            .iter()
            .find(|container| container.endpoint().id() == endpoint_id)
            .map(|container| container.as_ref())
    }

    /// Mutable access, e.g. to start a container created without auto-startup
    pub fn container_mut(&mut self, endpoint_id: &str) -> Option<&mut Box<dyn ListenerContainer>> {
        self.containers
            .iter_mut()
            .find(|container| container.endpoint().id() == endpoint_id)
    }

    /// Endpoint ids of created containers, in creation order
    pub fn container_ids(&self) -> Vec<&str> {
        self.containers
            .iter()
            .map(|container| container.endpoint().id())
            .collect()
    }

    pub fn running_count(&self) -> usize {
        self.containers
            .iter()
            .filter(|container| container.is_running())
            .count()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}
