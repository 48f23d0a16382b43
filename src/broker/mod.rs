//! In-process Broker
//!
//! A minimal in-memory message broker used by the default listener container.
//! Every queue is a tokio broadcast channel: all listeners bound to a queue
//! see every message published after they subscribed. There is no
//! persistence, acknowledgement or redelivery.

mod message;

pub use message::Message;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Buffered messages per queue before slow subscribers start lagging
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Shared in-memory broker
#[derive(Debug, Clone)]
pub struct InMemoryBroker {
    queues: Arc<RwLock<HashMap<String, broadcast::Sender<Arc<Message>>>>>,
    capacity: usize,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queues: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Declare a queue; declaring an existing queue is a no-op
    pub fn declare_queue(&self, name: &str) {
        let mut queues = self.queues.write().unwrap_or_else(|e| e.into_inner());
        queues
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
    }

    pub fn has_queue(&self, name: &str) -> bool {
        let queues = self.queues.read().unwrap_or_else(|e| e.into_inner());
        queues.contains_key(name)
    }

    /// Subscribe to a queue, declaring it if needed
    pub fn subscribe(&self, name: &str) -> broadcast::Receiver<Arc<Message>> {
        self.declare_queue(name);
        let queues = self.queues.read().unwrap_or_else(|e| e.into_inner());
        match queues.get(name) {
            Some(sender) => sender.subscribe(),
            // declare_queue above guarantees presence
            None => broadcast::channel(1).1,
        }
    }

    /// Publish a message to its queue
    ///
    /// Returns the number of listeners the message was handed to; a queue
    /// nobody listens on drops the message.
    pub fn publish(&self, message: Message) -> usize {
        let queues = self.queues.read().unwrap_or_else(|e| e.into_inner());
        match queues.get(message.queue()) {
            Some(sender) => {
                let queue = message.queue().to_string();
                let delivered = sender.send(Arc::new(message)).unwrap_or(0);
                log::trace!("Published to '{}' ({} listeners)", queue, delivered);
                delivered
            }
            None => {
                log::debug!("Dropping message for undeclared queue '{}'", message.queue());
                0
            }
        }
    }

    pub fn queue_names(&self) -> Vec<String> {
        let queues = self.queues.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = queues.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}
