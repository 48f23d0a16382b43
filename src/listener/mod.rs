//! Listener Declarations and Endpoints
//!
//! Turns listener declarations attached to component methods into running
//! message listeners.
//!
//! # Overview
//!
//! Processing happens in four stages:
//!
//! 1. **Discovery**: the [`ListenerScanner`] walks every component of a
//!    [`ComponentSource`] and collects the declarations of each listener
//!    method, expanding reusable markers through the [`MarkerRegistry`]
//! 2. **Resolution**: every queue reference is resolved against the object
//!    graph by the [`QueueReferenceResolver`] into queue names or queue
//!    objects
//! 3. **Endpoint building**: the [`EndpointBuilder`] turns a merged
//!    declaration and its resolved queues into an [`Endpoint`]
//! 4. **Lifecycle**: the [`EndpointRegistry`] creates one container per
//!    endpoint from the named [`ContainerFactory`], starts them together and
//!    stops them in reverse order
//!
//! ```text
//! component ──► declarations ──► resolved queues ──► Endpoint ──► container
//!   (scan)        (markers)        (resolver)        (registry)   (factory)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use rabbit_listeners::listener::api::*;
//! use rabbit_listeners::context::ApplicationContext;
//! use std::sync::Arc;
//!
//! struct Orders;
//!
//! impl ListenerComponent for Orders {
//!     fn name(&self) -> &str {
//!         "orders"
//!     }
//!
//!     fn listener_methods(&self) -> Vec<ListenerMethod> {
//!         vec![ListenerMethod::new("on_order", |_message| Ok(()))
//!             .listen(ListenerDeclaration::new(["orders"]))]
//!     }
//! }
//!
//! # fn example() -> Result<(), ListenerError> {
//! let factory = RecordingContainerFactory::new();
//! let mut context = ApplicationContext::new();
//! context.register_factory(DEFAULT_CONTAINER_FACTORY, Arc::new(factory))?;
//! context.add_component(Arc::new(Orders));
//! context.refresh()?;
//! context.close()?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod component;
pub(crate) mod container;
pub(crate) mod declaration;
pub(crate) mod endpoint;
pub(crate) mod error;
pub(crate) mod expression;
pub(crate) mod meta;
pub(crate) mod registry;
pub(crate) mod resolver;
pub(crate) mod scanner;
pub(crate) mod simple;
pub mod testing;

pub use component::{
    discover_components, ComponentEntry, ComponentSource, HandlerRef, ListenerComponent,
    ListenerMethod, MessageHandler,
};
pub use container::{ContainerFactory, ListenerContainer};
pub use declaration::{ListenerDeclaration, DEFAULT_CONTAINER_FACTORY};
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::{ContainerError, HandlerError, ListenerError, ListenerResult, StopFailure};
pub use expression::{ExpressionEvaluator, ReferenceEvaluator};
pub use meta::{MarkerDefinition, MarkerRegistry};
pub use registry::{EndpointRegistry, RegistryState};
pub use resolver::{QueueReferenceResolver, ResolvedQueue};
pub use scanner::{ListenerScanner, GENERATED_ID_PREFIX};
pub use simple::{SimpleContainerFactory, SimpleListenerContainer};

#[cfg(test)]
mod tests;
