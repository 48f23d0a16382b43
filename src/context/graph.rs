//! Named Object Graph
//!
//! The subset of the host's object graph the listener pipeline needs: named
//! objects that indirect queue references point at, and string properties used
//! by `${...}` placeholders.

use serde::Deserialize;
use std::fmt;

/// A queue definition registered as a named object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Queue {
    name: String,
    #[serde(default = "default_durable")]
    durable: bool,
    #[serde(default)]
    exclusive: bool,
    #[serde(default)]
    auto_delete: bool,
}

fn default_durable() -> bool {
    true
}

impl Queue {
    /// Durable, non-exclusive queue
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            exclusive: false,
            auto_delete: false,
        }
    }

    pub fn with_durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }

    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn with_auto_delete(mut self, auto_delete: bool) -> Self {
        self.auto_delete = auto_delete;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn is_auto_delete(&self) -> bool {
        self.auto_delete
    }
}

/// Value of a named object or of an evaluated expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Queue(Queue),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Queue(_) => "queue",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{}", text),
            Value::Queue(queue) => write!(f, "Queue({})", queue.name()),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Boolean(value) => write!(f, "{}", value),
        }
    }
}

impl From<Queue> for Value {
    fn from(queue: Queue) -> Self {
        Value::Queue(queue)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

/// Read access to named objects and properties
pub trait ObjectGraph {
    /// Look up a named object
    fn lookup(&self, name: &str) -> Option<&Value>;

    /// Look up a string property
    fn property(&self, key: &str) -> Option<&str>;
}
