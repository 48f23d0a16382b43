//! Application context lifecycle

use crate::context::graph::{ObjectGraph, Value};
use crate::core::config::Settings;
use crate::listener::component::{discover_components, ComponentSource, ListenerComponent};
use crate::listener::container::ContainerFactory;
use crate::listener::endpoint::Endpoint;
use crate::listener::error::ListenerResult;
use crate::listener::expression::ExpressionEvaluator;
use crate::listener::meta::{MarkerDefinition, MarkerRegistry};
use crate::listener::registry::{EndpointRegistry, RegistryState};
use crate::listener::resolver::QueueReferenceResolver;
use crate::listener::scanner::ListenerScanner;
use std::collections::HashMap;
use std::sync::Arc;

/// Host of components, named objects and the endpoint registry
pub struct ApplicationContext {
    objects: HashMap<String, Value>,
    properties: HashMap<String, String>,
    components: Vec<Arc<dyn ListenerComponent>>,
    markers: MarkerRegistry,
    resolver: QueueReferenceResolver,
    registry: EndpointRegistry,
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut objects: Vec<&str> = self.objects.keys().map(String::as_str).collect();
        objects.sort();
        f.debug_struct("ApplicationContext")
            .field("objects", &objects)
            .field(
                "components",
                &self.components.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("markers", &self.markers.len())
            .field("registry", &self.registry)
            .finish()
    }
}

impl Default for ApplicationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationContext {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            properties: HashMap::new(),
            components: Vec::new(),
            markers: MarkerRegistry::new(),
            resolver: QueueReferenceResolver::default(),
            registry: EndpointRegistry::new(),
        }
    }

    /// Context populated with the queues, properties, markers and listener
    /// defaults of a settings file
    pub fn from_settings(settings: &Settings) -> ListenerResult<Self> {
        let mut context = Self::new();
        context
            .registry
            .set_default_factory(settings.listener.default_container_factory.clone())?;
        context
            .registry
            .set_auto_startup(settings.listener.auto_startup)?;

        for (key, value) in &settings.properties {
            context.set_property(key.clone(), value.clone());
        }
        for (name, queue) in &settings.queues {
            context.add_object(name.clone(), queue.clone());
        }
        for (id, marker) in &settings.markers {
            context.define_marker(id.clone(), marker.to_definition());
        }

        log::debug!(
            "Context from settings: {} properties, {} queues, {} markers",
            settings.properties.len(),
            settings.queues.len(),
            settings.markers.len()
        );
        Ok(context)
    }

    /// Add a component; components are scanned in the order they were added
    pub fn add_component(&mut self, component: Arc<dyn ListenerComponent>) {
        log::trace!("Added component '{}'", component.name());
        self.components.push(component);
    }

    /// Add every component submitted with `listener_component!`
    pub fn add_discovered_components(&mut self) -> usize {
        let entries = discover_components();
        for entry in &entries {
            log::debug!("Discovered component '{}'", entry.name);
            self.add_component((entry.factory)());
        }
        entries.len()
    }

    pub fn add_object(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.objects.insert(name.into(), value.into());
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn define_marker(&mut self, id: impl Into<String>, definition: MarkerDefinition) {
        self.markers.define(id, definition);
    }

    /// Replace the evaluator used for `#{...}` references
    pub fn set_evaluator(&mut self, evaluator: Arc<dyn ExpressionEvaluator>) {
        self.resolver = QueueReferenceResolver::new(evaluator);
    }

    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn ContainerFactory>,
    ) -> ListenerResult<()> {
        self.registry.register_factory(name, factory)
    }

    pub fn set_default_factory(&mut self, name: impl Into<String>) -> ListenerResult<()> {
        self.registry.set_default_factory(name)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EndpointRegistry {
        &mut self.registry
    }

    pub fn is_active(&self) -> bool {
        self.registry.state() == RegistryState::Started
    }

    fn scanner(&self) -> ListenerScanner {
        ListenerScanner::new(
            self.markers.clone(),
            self.resolver.clone(),
            self.registry.default_factory(),
        )
    }

    /// Endpoints a refresh would register, without registering them
    pub fn discover_endpoints(&self) -> ListenerResult<Vec<Endpoint>> {
        self.scanner().scan(self, self)
    }

    /// Scan every component, register the endpoints and start the registry
    ///
    /// Returns the number of endpoints registered. A context refreshes once.
    pub fn refresh(&mut self) -> ListenerResult<usize> {
        log::info!(
            "Refreshing context with {} component(s)",
            self.components.len()
        );
        let scanner = self.scanner();
        let mut registry = std::mem::take(&mut self.registry);
        let scanned = scanner.scan_into(&*self, &*self, &mut registry);
        self.registry = registry;

        let count = scanned?;
        self.registry.start()?;
        Ok(count)
    }

    /// Stop every container; closing a context that never refreshed does nothing
    pub fn close(&mut self) -> ListenerResult<()> {
        if self.registry.state() == RegistryState::Collecting {
            log::debug!("Context closed before refresh");
            return Ok(());
        }
        log::info!("Closing context");
        self.registry.stop()
    }
}

impl ObjectGraph for ApplicationContext {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.objects.get(name)
    }

    fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl ComponentSource for ApplicationContext {
    fn components(&self) -> Vec<Arc<dyn ListenerComponent>> {
        self.components.clone()
    }
}
