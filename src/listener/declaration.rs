//! Listener Declarations
//!
//! The raw listener metadata found on a handler method before any queue
//! reference has been resolved.

use crate::listener::error::{ListenerError, ListenerResult};

/// Container factory name used when a declaration does not name one
pub const DEFAULT_CONTAINER_FACTORY: &str = "rabbitListenerContainerFactory";

/// Listener metadata as declared on a handler method or embedded in a marker
///
/// Queue references are kept verbatim; each one may hold a single literal
/// name, an indirect `#{...}` expression, or a comma-joined mix of both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerDeclaration {
    queues: Vec<String>,
    container_factory: Option<String>,
    id: Option<String>,
    exclusive: Option<bool>,
    priority: Option<i32>,
    auto_startup: Option<bool>,
}

impl ListenerDeclaration {
    /// Declaration listening on the given queue references, in order
    pub fn new<I, S>(queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queues: queues.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_container_factory(mut self, name: impl Into<String>) -> Self {
        self.container_factory = Some(name.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = Some(exclusive);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_auto_startup(mut self, auto_startup: bool) -> Self {
        self.auto_startup = Some(auto_startup);
        self
    }

    pub fn queues(&self) -> &[String] {
        &self.queues
    }

    pub fn container_factory(&self) -> Option<&str> {
        self.container_factory.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn exclusive(&self) -> bool {
        self.exclusive.unwrap_or(false)
    }

    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    pub fn auto_startup(&self) -> Option<bool> {
        self.auto_startup
    }

    /// Factory name to register under, falling back to `default_factory`
    pub fn factory_or<'a>(&'a self, default_factory: &'a str) -> &'a str {
        self.container_factory.as_deref().unwrap_or(default_factory)
    }

    /// Reject declarations without any queue reference
    pub fn validate(&self, location: &str) -> ListenerResult<()> {
        if self.queues.is_empty() {
            return Err(ListenerError::configuration(format!(
                "Listener declaration on '{}' does not name any queue",
                location
            )));
        }
        Ok(())
    }

    /// Append `other` after `self`: queue references are concatenated and
    /// attributes already set on `self` win.
    pub(crate) fn merge(mut self, other: &ListenerDeclaration) -> Self {
        self.queues.extend(other.queues.iter().cloned());
        self.container_factory = self
            .container_factory
            .or_else(|| other.container_factory.clone());
        self.id = self.id.or_else(|| other.id.clone());
        self.exclusive = self.exclusive.or(other.exclusive);
        self.priority = self.priority.or(other.priority);
        self.auto_startup = self.auto_startup.or(other.auto_startup);
        self
    }

    /// Attributes of `preferred` override those of `self`, queues untouched
    pub(crate) fn override_attributes(mut self, preferred: &ListenerDeclaration) -> Self {
        if preferred.container_factory.is_some() {
            self.container_factory = preferred.container_factory.clone();
        }
        if preferred.id.is_some() {
            self.id = preferred.id.clone();
        }
        if preferred.exclusive.is_some() {
            self.exclusive = preferred.exclusive;
        }
        if preferred.priority.is_some() {
            self.priority = preferred.priority;
        }
        if preferred.auto_startup.is_some() {
            self.auto_startup = preferred.auto_startup;
        }
        self
    }
}
