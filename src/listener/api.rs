//! Public API for listener processing
//!
//! External modules should import from here rather than from the internal
//! modules.

// Components and discovery
pub use crate::listener::component::{
    discover_components, ComponentEntry, ComponentSource, HandlerRef, ListenerComponent,
    ListenerMethod, MessageHandler,
};

// Declarations and markers
pub use crate::listener::declaration::{ListenerDeclaration, DEFAULT_CONTAINER_FACTORY};
pub use crate::listener::meta::{MarkerDefinition, MarkerRegistry};

// Queue reference resolution
pub use crate::listener::expression::{ExpressionEvaluator, ReferenceEvaluator};
pub use crate::listener::resolver::{QueueReferenceResolver, ResolvedQueue};

// Endpoints, scanning and lifecycle
pub use crate::listener::endpoint::{Endpoint, EndpointBuilder};
pub use crate::listener::registry::{EndpointRegistry, RegistryState};
pub use crate::listener::scanner::{ListenerScanner, GENERATED_ID_PREFIX};

// Containers
pub use crate::listener::container::{ContainerFactory, ListenerContainer};
pub use crate::listener::simple::{SimpleContainerFactory, SimpleListenerContainer};
pub use crate::listener::testing::{LifecycleEvent, RecordedContainer, RecordingContainerFactory};

// Error handling
pub use crate::listener::error::{
    ContainerError, HandlerError, ListenerError, ListenerResult, StopFailure,
};

// Object graph
pub use crate::context::graph::{ObjectGraph, Queue, Value};
