//! Shared fixtures for listener tests

use crate::context::graph::{ObjectGraph, Value};
use crate::listener::component::{HandlerRef, ListenerComponent, ListenerMethod};
use crate::listener::declaration::ListenerDeclaration;
use crate::listener::endpoint::{Endpoint, EndpointBuilder};
use crate::listener::resolver::ResolvedQueue;
use std::collections::HashMap;

mod scanner;

/// Object graph backed by plain maps
#[derive(Default)]
pub(crate) struct MapGraph {
    objects: HashMap<String, Value>,
    properties: HashMap<String, String>,
}

impl MapGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_object(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.objects.insert(name.to_string(), value.into());
        self
    }

    pub(crate) fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}

impl ObjectGraph for MapGraph {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.objects.get(name)
    }

    fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Component with a fixed list of methods
pub(crate) struct FixedComponent {
    name: String,
    methods: Vec<ListenerMethod>,
}

impl FixedComponent {
    pub(crate) fn new(name: &str, methods: Vec<ListenerMethod>) -> Self {
        Self {
            name: name.to_string(),
            methods,
        }
    }
}

impl ListenerComponent for FixedComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn listener_methods(&self) -> Vec<ListenerMethod> {
        self.methods.clone()
    }
}

/// Listener method consuming from literal queue references
pub(crate) fn listening(name: &str, queues: &[&str]) -> ListenerMethod {
    ListenerMethod::new(name, |_| Ok(())).listen(ListenerDeclaration::new(queues.iter().copied()))
}

/// Endpoint on a single literal queue
pub(crate) fn endpoint(id: &str, queue: &str) -> Endpoint {
    endpoint_with(id, ListenerDeclaration::new([queue]))
}

pub(crate) fn endpoint_with(id: &str, declaration: ListenerDeclaration) -> Endpoint {
    let resolved = declaration
        .queues()
        .iter()
        .map(|queue| vec![ResolvedQueue::Name(queue.clone())])
        .collect();
    let handler = HandlerRef::from_fn("fixture", id, |_| Ok(()));
    EndpointBuilder::new("testFactory").build(id, &declaration, resolved, handler)
}
