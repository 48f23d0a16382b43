//! Shared fixtures for integration tests

#![allow(dead_code)]

use rabbit_listeners::context::ApplicationContext;
use rabbit_listeners::listener::api::*;
use std::sync::Arc;

pub const TEST_FACTORY: &str = "testFactory";

/// Component whose methods are supplied by the test
pub struct TestComponent {
    name: &'static str,
    methods: Vec<ListenerMethod>,
}

impl TestComponent {
    pub fn new(name: &'static str, methods: Vec<ListenerMethod>) -> Arc<dyn ListenerComponent> {
        Arc::new(Self { name, methods })
    }
}

impl ListenerComponent for TestComponent {
    fn name(&self) -> &str {
        self.name
    }

    fn listener_methods(&self) -> Vec<ListenerMethod> {
        self.methods.clone()
    }
}

/// Method named `handleIt` listening on the given references
pub fn handle_it(references: &[&str]) -> ListenerMethod {
    ListenerMethod::new("handleIt", |_| Ok(()))
        .listen(ListenerDeclaration::new(references.iter().copied()))
}

/// Context with the named test queues, the `FooListener` marker and a
/// recording factory registered as default under `testFactory`
pub fn test_context() -> (ApplicationContext, RecordingContainerFactory) {
    let factory = RecordingContainerFactory::new();
    let mut context = ApplicationContext::new();
    context
        .register_factory(TEST_FACTORY, Arc::new(factory.clone()))
        .expect("factory registration");
    context
        .set_default_factory(TEST_FACTORY)
        .expect("default factory");

    context.add_object("myTestQueue", Queue::new("testQueue"));
    context.add_object("mySecondQueue", Queue::new("secondQueue"));
    context.add_object("Q1", Queue::new("secondQueue"));
    context.define_marker(
        "FooListener",
        MarkerDefinition::declaring(ListenerDeclaration::new(["metaTestQueue"])),
    );
    (context, factory)
}
