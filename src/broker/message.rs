//! Broker messages

use std::collections::BTreeMap;

/// A message delivered to a listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    queue: String,
    body: Vec<u8>,
    headers: BTreeMap<String, String>,
}

impl Message {
    pub fn new(queue: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            queue: queue.into(),
            body: body.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Queue the message was published to
    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, lossily decoded
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}
