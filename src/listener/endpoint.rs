//! Listener Endpoints
//!
//! An [`Endpoint`] is the resolved, immutable unit of registration: the queue
//! names and queue objects a container consumes from, the handler it invokes
//! and the container factory responsible for it.

use crate::context::graph::Queue;
use crate::listener::component::HandlerRef;
use crate::listener::declaration::ListenerDeclaration;
use crate::listener::resolver::ResolvedQueue;

/// Resolved listener endpoint
#[derive(Debug, Clone)]
pub struct Endpoint {
    id: String,
    queue_names: Vec<String>,
    queues: Vec<Queue>,
    handler: HandlerRef,
    container_factory: String,
    exclusive: bool,
    priority: Option<i32>,
    auto_startup: Option<bool>,
}

impl Endpoint {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Literal queue names in declaration order, duplicates kept
    pub fn queue_names(&self) -> &[String] {
        &self.queue_names
    }

    /// Queue objects in declaration order
    pub fn queues(&self) -> &[Queue] {
        &self.queues
    }

    /// Every queue name the endpoint consumes from: literal names first,
    /// then the names of queue objects
    pub fn all_queue_names(&self) -> Vec<&str> {
        self.queue_names
            .iter()
            .map(String::as_str)
            .chain(self.queues.iter().map(Queue::name))
            .collect()
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn container_factory(&self) -> &str {
        &self.container_factory
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    /// Per-endpoint override of the registry's auto-startup setting
    pub fn auto_startup(&self) -> Option<bool> {
        self.auto_startup
    }
}

/// Assembles endpoints from resolved declarations
#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    default_factory: String,
}

impl EndpointBuilder {
    pub fn new(default_factory: impl Into<String>) -> Self {
        Self {
            default_factory: default_factory.into(),
        }
    }

    pub fn default_factory(&self) -> &str {
        &self.default_factory
    }

    /// Build an endpoint from a declaration and its resolved references
    ///
    /// `resolved` holds one list per reference string, in declaration order.
    pub fn build(
        &self,
        id: impl Into<String>,
        declaration: &ListenerDeclaration,
        resolved: Vec<Vec<ResolvedQueue>>,
        handler: HandlerRef,
    ) -> Endpoint {
        let mut queue_names = Vec::new();
        let mut queues = Vec::new();

        for entry in resolved.into_iter().flatten() {
            match entry {
                ResolvedQueue::Name(name) => queue_names.push(name),
                ResolvedQueue::Queue(queue) => queues.push(queue),
            }
        }

        Endpoint {
            id: id.into(),
            queue_names,
            queues,
            handler,
            container_factory: declaration.factory_or(&self.default_factory).to_string(),
            exclusive: declaration.exclusive(),
            priority: declaration.priority(),
            auto_startup: declaration.auto_startup(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::declaration::DEFAULT_CONTAINER_FACTORY;

    fn handler() -> HandlerRef {
        HandlerRef::from_fn("component", "handleIt", |_| Ok(()))
    }

    #[test]
    fn test_names_and_queues_keep_relative_order() {
        let builder = EndpointBuilder::new(DEFAULT_CONTAINER_FACTORY);
        let declaration = ListenerDeclaration::new(["metaTestQueue, #{ref:Q1}", "testQueue"]);
        let resolved = vec![
            vec![
                ResolvedQueue::Name("metaTestQueue".to_string()),
                ResolvedQueue::Queue(Queue::new("secondQueue")),
            ],
            vec![ResolvedQueue::Name("testQueue".to_string())],
        ];

        let endpoint = builder.build("e1", &declaration, resolved, handler());
        assert_eq!(endpoint.queue_names(), &["metaTestQueue", "testQueue"]);
        assert_eq!(endpoint.queues(), &[Queue::new("secondQueue")]);
        assert_eq!(
            endpoint.all_queue_names(),
            vec!["metaTestQueue", "testQueue", "secondQueue"]
        );
        assert_eq!(endpoint.container_factory(), DEFAULT_CONTAINER_FACTORY);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let builder = EndpointBuilder::new("f");
        let declaration = ListenerDeclaration::new(["q", "q"]);
        let resolved = vec![
            vec![ResolvedQueue::Name("q".to_string())],
            vec![ResolvedQueue::Name("q".to_string())],
        ];

        let endpoint = builder.build("e", &declaration, resolved, handler());
        assert_eq!(endpoint.queue_names(), &["q", "q"]);
    }

    #[test]
    fn test_declaration_attributes_are_carried() {
        let builder = EndpointBuilder::new("default");
        let declaration = ListenerDeclaration::new(["q"])
            .with_container_factory("testFactory")
            .with_exclusive(true)
            .with_priority(7)
            .with_auto_startup(false);

        let endpoint = builder.build(
            "e",
            &declaration,
            vec![vec![ResolvedQueue::Name("q".to_string())]],
            handler(),
        );
        assert_eq!(endpoint.container_factory(), "testFactory");
        assert!(endpoint.is_exclusive());
        assert_eq!(endpoint.priority(), Some(7));
        assert_eq!(endpoint.auto_startup(), Some(false));
        assert_eq!(endpoint.handler().to_string(), "component::handleIt");
    }
}
