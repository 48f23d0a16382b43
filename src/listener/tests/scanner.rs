//! Tests for listener discovery and registration

#[cfg(test)]
mod tests {
    use crate::listener::api::*;
    use crate::listener::tests::{listening, FixedComponent, MapGraph};
    use std::sync::Arc;

    fn components(list: Vec<FixedComponent>) -> Vec<Arc<dyn ListenerComponent>> {
        list.into_iter()
            .map(|component| Arc::new(component) as Arc<dyn ListenerComponent>)
            .collect()
    }

    fn graph() -> MapGraph {
        MapGraph::new()
            .with_object("myTestQueue", Queue::new("testQueue"))
            .with_object("mySecondQueue", Queue::new("secondQueue"))
            .with_property("orders.queue", "orders")
    }

    #[test]
    fn test_scan_keeps_component_and_method_order() {
        let source = components(vec![
            FixedComponent::new(
                "alpha",
                vec![
                    listening("first", &["q1"]),
                    ListenerMethod::new("helper", |_| Ok(())),
                    listening("second", &["q2"]),
                ],
            ),
            FixedComponent::new("beta", vec![listening("third", &["q3"])]),
        ]);

        let scanner = ListenerScanner::default();
        let endpoints = scanner.scan(&source, &graph()).unwrap();

        let handlers: Vec<String> = endpoints.iter().map(|e| e.handler().to_string()).collect();
        assert_eq!(handlers, vec!["alpha::first", "alpha::second", "beta::third"]);
        let ids: Vec<&str> = endpoints.iter().map(|e| e.id()).collect();
        assert_eq!(
            ids,
            vec!["listener-endpoint#0", "listener-endpoint#1", "listener-endpoint#2"]
        );
        assert!(endpoints
            .iter()
            .all(|e| e.container_factory() == DEFAULT_CONTAINER_FACTORY));
    }

    #[test]
    fn test_explicit_id_and_factory_are_used() {
        let method = ListenerMethod::new("handle", |_| Ok(())).listen(
            ListenerDeclaration::new(["${orders.queue}"])
                .with_id("orders-listener")
                .with_container_factory("fastFactory")
                .with_exclusive(true)
                .with_priority(7),
        );
        let source = components(vec![FixedComponent::new("orders", vec![method])]);

        let endpoints = ListenerScanner::default().scan(&source, &graph()).unwrap();

        assert_eq!(endpoints.len(), 1);
        let endpoint = &endpoints[0];
        assert_eq!(endpoint.id(), "orders-listener");
        assert_eq!(endpoint.container_factory(), "fastFactory");
        assert_eq!(endpoint.queue_names(), ["orders".to_string()]);
        assert!(endpoint.is_exclusive());
        assert_eq!(endpoint.priority(), Some(7));
    }

    #[test]
    fn test_marker_methods_become_endpoints() {
        let mut markers = MarkerRegistry::new();
        markers.define(
            "FooListener",
            MarkerDefinition::declaring(ListenerDeclaration::new(["metaTestQueue"])),
        );
        let method = ListenerMethod::new("handleIt", |_| Ok(())).marked("FooListener");
        let source = components(vec![FixedComponent::new("metaBean", vec![method])]);

        let scanner = ListenerScanner::new(
            markers,
            QueueReferenceResolver::default(),
            DEFAULT_CONTAINER_FACTORY,
        );
        let endpoints = scanner.scan(&source, &graph()).unwrap();

        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].queue_names(), ["metaTestQueue".to_string()]);
    }

    #[test]
    fn test_declaration_without_queues_is_rejected() {
        let method = ListenerMethod::new("empty", |_| Ok(()))
            .listen(ListenerDeclaration::new(Vec::<String>::new()));
        let source = components(vec![FixedComponent::new("broken", vec![method])]);

        let result = ListenerScanner::default().scan(&source, &graph());

        match result {
            Err(ListenerError::Configuration { message }) => {
                assert!(message.contains("broken::empty"))
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_resolution_registers_nothing() {
        let factory = RecordingContainerFactory::new();
        let mut registry = EndpointRegistry::new();
        registry
            .register_factory(DEFAULT_CONTAINER_FACTORY, Arc::new(factory.clone()))
            .unwrap();

        let source = components(vec![
            FixedComponent::new("good", vec![listening("handle", &["q1"])]),
            FixedComponent::new("bad", vec![listening("handle", &["#{@missingQueue}"])]),
        ]);

        let result = ListenerScanner::default().scan_into(&source, &graph(), &mut registry);

        assert!(matches!(result, Err(ListenerError::Resolution { .. })));
        assert!(registry.is_empty());
        assert_eq!(registry.state(), RegistryState::Collecting);
    }

    #[test]
    fn test_scan_into_registers_under_declared_factory() {
        let mut registry = EndpointRegistry::new();
        let method = ListenerMethod::new("handle", |_| Ok(()))
            .listen(ListenerDeclaration::new(["#{@myTestQueue}"]).with_container_factory("fast"));
        let source = components(vec![
            FixedComponent::new("a", vec![method]),
            FixedComponent::new("b", vec![listening("handle", &["plain"])]),
        ]);

        let count = ListenerScanner::default()
            .scan_into(&source, &graph(), &mut registry)
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.endpoints_for_factory("fast").len(), 1);
        assert_eq!(
            registry.endpoints_for_factory(DEFAULT_CONTAINER_FACTORY).len(),
            1
        );
        let queues = registry.endpoints()[0].queues().to_vec();
        assert_eq!(queues, vec![Queue::new("testQueue")]);
    }

    #[test]
    fn test_duplicate_declared_ids_register_nothing() {
        let mut registry = EndpointRegistry::new();
        let declare = |name: &str| {
            ListenerMethod::new(name, |_| Ok(()))
                .listen(ListenerDeclaration::new(["q"]).with_id("shared"))
        };
        let source = components(vec![FixedComponent::new(
            "dup",
            vec![declare("one"), declare("two")],
        )]);

        let result = ListenerScanner::default().scan_into(&source, &graph(), &mut registry);

        assert!(matches!(result, Err(ListenerError::Configuration { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_scan_into_started_registry_is_rejected() {
        let mut registry = EndpointRegistry::new();
        registry.start().unwrap();
        let source = components(vec![FixedComponent::new("late", vec![listening("h", &["q"])])]);

        let result = ListenerScanner::default().scan_into(&source, &graph(), &mut registry);

        assert!(matches!(result, Err(ListenerError::Configuration { .. })));
    }

    #[test]
    fn test_custom_evaluator_is_used() {
        let evaluator = |expression: &str, _graph: &dyn ObjectGraph| -> ListenerResult<Value> {
            Ok(Value::from(format!("evaluated-{}", expression.trim())))
        };
        let scanner = ListenerScanner::new(
            MarkerRegistry::new(),
            QueueReferenceResolver::new(Arc::new(evaluator)),
            DEFAULT_CONTAINER_FACTORY,
        );
        let source = components(vec![FixedComponent::new(
            "custom",
            vec![listening("handle", &["#{anything}"])],
        )]);

        let endpoints = scanner.scan(&source, &MapGraph::new()).unwrap();

        assert_eq!(endpoints[0].queue_names(), ["evaluated-anything".to_string()]);
    }
}
