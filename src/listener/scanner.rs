//! Registration Scanner
//!
//! Walks every component and every listener method, expands markers, resolves
//! queue references and builds one endpoint per listening method. Scanning is
//! all or nothing: a single bad declaration fails the whole scan and nothing
//! is registered.

use crate::context::graph::ObjectGraph;
use crate::listener::component::{ComponentSource, HandlerRef, ListenerComponent, ListenerMethod};
use crate::listener::declaration::DEFAULT_CONTAINER_FACTORY;
use crate::listener::endpoint::{Endpoint, EndpointBuilder};
use crate::listener::error::{ListenerError, ListenerResult};
use crate::listener::meta::MarkerRegistry;
use crate::listener::registry::{EndpointRegistry, RegistryState};
use crate::listener::resolver::QueueReferenceResolver;
use std::cell::Cell;
use std::collections::HashSet;

/// Prefix of generated endpoint ids
pub const GENERATED_ID_PREFIX: &str = "listener-endpoint#";

/// Discovers listener methods and turns them into endpoints
#[derive(Debug)]
pub struct ListenerScanner {
    markers: MarkerRegistry,
    resolver: QueueReferenceResolver,
    builder: EndpointBuilder,
    next_id: Cell<usize>,
}

impl Default for ListenerScanner {
    fn default() -> Self {
        Self::new(
            MarkerRegistry::new(),
            QueueReferenceResolver::default(),
            DEFAULT_CONTAINER_FACTORY,
        )
    }
}

impl ListenerScanner {
    pub fn new(
        markers: MarkerRegistry,
        resolver: QueueReferenceResolver,
        default_factory: impl Into<String>,
    ) -> Self {
        Self {
            markers,
            resolver,
            builder: EndpointBuilder::new(default_factory),
            next_id: Cell::new(0),
        }
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    /// Build endpoints for every listener method, components in source order
    /// and methods in declaration order
    pub fn scan(
        &self,
        source: &dyn ComponentSource,
        graph: &dyn ObjectGraph,
    ) -> ListenerResult<Vec<Endpoint>> {
        let mut endpoints = Vec::new();

        for component in source.components() {
            let methods = component.listener_methods();
            log::trace!(
                "Scanning component '{}' ({} methods)",
                component.name(),
                methods.len()
            );
            for method in &methods {
                if let Some(endpoint) = self.process_method(component.as_ref(), method, graph)? {
                    endpoints.push(endpoint);
                }
            }
        }

        log::debug!("Scan produced {} endpoint(s)", endpoints.len());
        Ok(endpoints)
    }

    /// Scan and register every endpoint, or none if anything fails
    pub fn scan_into(
        &self,
        source: &dyn ComponentSource,
        graph: &dyn ObjectGraph,
        registry: &mut EndpointRegistry,
    ) -> ListenerResult<usize> {
        if registry.state() != RegistryState::Collecting {
            return Err(ListenerError::configuration(format!(
                "Cannot register listeners once the endpoint registry is {}",
                registry.state()
            )));
        }

        let endpoints = self.scan(source, graph)?;

        let mut ids = HashSet::new();
        for endpoint in &endpoints {
            if !ids.insert(endpoint.id()) || registry.endpoint(endpoint.id()).is_some() {
                return Err(ListenerError::configuration(format!(
                    "Another endpoint is already registered with id '{}'",
                    endpoint.id()
                )));
            }
        }

        let count = endpoints.len();
        for endpoint in endpoints {
            let factory_name = endpoint.container_factory().to_string();
            registry.register(endpoint, Some(&factory_name))?;
        }
        Ok(count)
    }

    fn process_method(
        &self,
        component: &dyn ListenerComponent,
        method: &ListenerMethod,
        graph: &dyn ObjectGraph,
    ) -> ListenerResult<Option<Endpoint>> {
        if !method.is_listener() {
            return Ok(None);
        }

        let location = format!("{}::{}", component.name(), method.name());
        let declaration = match self.markers.merged_declaration(method)? {
            Some(declaration) => declaration,
            None => return Ok(None),
        };
        declaration.validate(&location)?;

        let resolved = self
            .resolver
            .resolve_all(declaration.queues(), graph)
            .map_err(|err| {
                log::debug!("Queue resolution failed for '{}': {}", location, err);
                err
            })?;

        let id = match declaration.id() {
            Some(id) => id.to_string(),
            None => {
                let n = self.next_id.get();
                self.next_id.set(n + 1);
                format!("{}{}", GENERATED_ID_PREFIX, n)
            }
        };

        let handler = HandlerRef::new(
            component.name(),
            method.name(),
            method.handler().clone(),
        );
        let endpoint = self.builder.build(id, &declaration, resolved, handler);
        log::debug!(
            "Endpoint '{}' for {} listens on {:?} / {:?}",
            endpoint.id(),
            location,
            endpoint.queue_names(),
            endpoint
                .queues()
                .iter()
                .map(|queue| queue.name())
                .collect::<Vec<_>>()
        );
        Ok(Some(endpoint))
    }
}
