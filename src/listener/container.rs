//! Listener Container Contracts
//!
//! A container performs the actual consumption for exactly one endpoint.
//! Containers are created by a [`ContainerFactory`] when the endpoint
//! registry starts and are never recreated by the registry afterwards.

use crate::listener::component::HandlerRef;
use crate::listener::endpoint::Endpoint;
use crate::listener::error::ContainerError;
use std::sync::Arc;

/// Running/stopped consumer bound to one endpoint
///
/// Containers own their execution context; the registry only starts and
/// stops them.
pub trait ListenerContainer: Send {
    /// Endpoint this container was built from
    fn endpoint(&self) -> &Endpoint;

    /// Bind the callback invoked for every delivered message
    fn set_message_handler(&mut self, handler: HandlerRef);

    fn start(&mut self) -> Result<(), ContainerError>;

    fn stop(&mut self) -> Result<(), ContainerError>;

    fn is_running(&self) -> bool;
}

/// Creates containers for endpoints
pub trait ContainerFactory: Send + Sync {
    fn create_container(
        &self,
        endpoint: Arc<Endpoint>,
    ) -> Result<Box<dyn ListenerContainer>, ContainerError>;
}
