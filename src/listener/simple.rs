//! Default Listener Container
//!
//! [`SimpleListenerContainer`] consumes from the [`InMemoryBroker`]: on start
//! it subscribes to each of its endpoint's queues and spawns one tokio task
//! per queue on the factory's runtime. A per-container broadcast channel
//! signals the tasks to finish on stop. Handlers run under a read lock on the
//! container's gate and `stop()` closes the gate under the write lock, so no
//! handler runs once `stop()` has returned.

use crate::broker::{InMemoryBroker, Message};
use crate::listener::component::HandlerRef;
use crate::listener::container::{ContainerFactory, ListenerContainer};
use crate::listener::endpoint::Endpoint;
use crate::listener::error::ContainerError;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Factory for containers consuming from an in-memory broker
#[derive(Debug, Clone)]
pub struct SimpleContainerFactory {
    broker: InMemoryBroker,
    runtime: Handle,
}

impl SimpleContainerFactory {
    pub fn new(broker: InMemoryBroker, runtime: Handle) -> Self {
        Self { broker, runtime }
    }

    /// Factory bound to the runtime of the calling context
    pub fn current(broker: InMemoryBroker) -> Result<Self, ContainerError> {
        let runtime = Handle::try_current()
            .map_err(|e| ContainerError::new(format!("no tokio runtime available: {}", e)))?;
        Ok(Self::new(broker, runtime))
    }

    pub fn broker(&self) -> &InMemoryBroker {
        &self.broker
    }
}

impl ContainerFactory for SimpleContainerFactory {
    fn create_container(
        &self,
        endpoint: Arc<Endpoint>,
    ) -> Result<Box<dyn ListenerContainer>, ContainerError> {
        Ok(Box::new(SimpleListenerContainer::new(
            endpoint,
            self.broker.clone(),
            self.runtime.clone(),
        )))
    }
}

/// Container running one consumer task per queue
pub struct SimpleListenerContainer {
    endpoint: Arc<Endpoint>,
    broker: InMemoryBroker,
    runtime: Handle,
    handler: Option<HandlerRef>,
    shutdown: Option<broadcast::Sender<()>>,
    gate: Arc<RwLock<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SimpleListenerContainer {
    pub fn new(endpoint: Arc<Endpoint>, broker: InMemoryBroker, runtime: Handle) -> Self {
        Self {
            endpoint,
            broker,
            runtime,
            handler: None,
            shutdown: None,
            gate: Arc::new(RwLock::new(false)),
            tasks: Vec::new(),
        }
    }

    fn spawn_consumer(&mut self, queue: &str, handler: HandlerRef, shutdown_tx: &broadcast::Sender<()>) {
        let mut messages = self.broker.subscribe(queue);
        let mut shutdown = shutdown_tx.subscribe();
        let queue = queue.to_string();
        let endpoint_id = self.endpoint.id().to_string();
        let gate = Arc::clone(&self.gate);

        let task = self.runtime.spawn(async move {
            log::trace!("Consumer for '{}' on queue '{}' running", endpoint_id, queue);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => break,
                    received = messages.recv() => match received {
                        Ok(message) => {
                            if !deliver(&gate, &handler, &message) {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            log::warn!(
                                "Consumer for '{}' lagged, {} message(s) from '{}' skipped",
                                endpoint_id,
                                skipped,
                                queue
                            );
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            log::trace!("Consumer for '{}' on queue '{}' finished", endpoint_id, queue);
        });
        self.tasks.push(task);
    }
}

// Invoke the handler unless the container has been stopped; false once closed
fn deliver(gate: &RwLock<bool>, handler: &HandlerRef, message: &Message) -> bool {
    let open = gate.read().unwrap_or_else(|e| e.into_inner());
    if !*open {
        return false;
    }
    if let Err(e) = handler.invoke(message) {
        log::warn!(
            "Handler {} failed on message from '{}': {}",
            handler,
            message.queue(),
            e
        );
    }
    true
}

impl ListenerContainer for SimpleListenerContainer {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn set_message_handler(&mut self, handler: HandlerRef) {
        self.handler = Some(handler);
    }

    fn start(&mut self) -> Result<(), ContainerError> {
        if self.is_running() {
            return Ok(());
        }
        let handler = self.handler.clone().ok_or_else(|| {
            ContainerError::new(format!(
                "no message handler bound for endpoint '{}'",
                self.endpoint.id()
            ))
        })?;

        let endpoint = Arc::clone(&self.endpoint);
        let mut seen = HashSet::new();
        let queues: Vec<&str> = endpoint
            .all_queue_names()
            .into_iter()
            .filter(|queue| seen.insert(*queue))
            .collect();
        if queues.is_empty() {
            return Err(ContainerError::new(format!(
                "endpoint '{}' has no queues",
                endpoint.id()
            )));
        }

        *self.gate.write().unwrap_or_else(|e| e.into_inner()) = true;
        let (shutdown_tx, _) = broadcast::channel(1);
        for queue in queues {
            self.spawn_consumer(queue, handler.clone(), &shutdown_tx);
        }
        self.shutdown = Some(shutdown_tx);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ContainerError> {
        // Blocks until handlers already running have returned
        *self.gate.write().unwrap_or_else(|e| e.into_inner()) = false;
        if let Some(shutdown) = self.shutdown.take() {
            // Tasks that already exited have dropped their receivers
            let _ = shutdown.send(());
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.shutdown.is_some()
    }
}
