//! Listener Components
//!
//! Components expose their listener methods explicitly through the
//! [`ListenerComponent`] trait. Each method carries an optional direct
//! declaration, any number of marker ids and the handler callback bound to it.
//! Components compiled into a binary can also be submitted for discovery with
//! the `listener_component!` macro.

use crate::broker::Message;
use crate::listener::declaration::ListenerDeclaration;
use crate::listener::error::HandlerError;
use std::fmt;
use std::sync::Arc;

/// Callback invoked for every message delivered to an endpoint
pub type MessageHandler = Arc<dyn Fn(&Message) -> Result<(), HandlerError> + Send + Sync>;

/// Application component that may declare listener methods
pub trait ListenerComponent: Send + Sync {
    /// Name of the component in the application graph
    fn name(&self) -> &str;

    /// Methods in declaration order
    fn listener_methods(&self) -> Vec<ListenerMethod>;
}

/// Source of components in a stable discovery order
pub trait ComponentSource {
    fn components(&self) -> Vec<Arc<dyn ListenerComponent>>;
}

impl ComponentSource for Vec<Arc<dyn ListenerComponent>> {
    fn components(&self) -> Vec<Arc<dyn ListenerComponent>> {
        self.clone()
    }
}

/// One method of a component together with its listener metadata
#[derive(Clone)]
pub struct ListenerMethod {
    name: String,
    markers: Vec<String>,
    declaration: Option<ListenerDeclaration>,
    handler: MessageHandler,
}

impl ListenerMethod {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Message) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            markers: Vec::new(),
            declaration: None,
            handler: Arc::new(handler),
        }
    }

    /// Attach a direct listener declaration
    pub fn listen(mut self, declaration: ListenerDeclaration) -> Self {
        self.declaration = Some(declaration);
        self
    }

    /// Apply a marker; markers are kept in the order they are applied
    pub fn marked(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn declaration(&self) -> Option<&ListenerDeclaration> {
        self.declaration.as_ref()
    }

    pub fn handler(&self) -> &MessageHandler {
        &self.handler
    }

    /// Whether the method carries any listener metadata at all
    pub fn is_listener(&self) -> bool {
        self.declaration.is_some() || !self.markers.is_empty()
    }
}

impl fmt::Debug for ListenerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerMethod")
            .field("name", &self.name)
            .field("markers", &self.markers)
            .field("declaration", &self.declaration)
            .finish()
    }
}

/// Owning component and method a handler was taken from
#[derive(Clone)]
pub struct HandlerRef {
    component: String,
    method: String,
    handler: MessageHandler,
}

impl HandlerRef {
    pub fn new(
        component: impl Into<String>,
        method: impl Into<String>,
        handler: MessageHandler,
    ) -> Self {
        Self {
            component: component.into(),
            method: method.into(),
            handler,
        }
    }

    /// Handler reference wrapping a plain closure
    pub fn from_fn<F>(component: impl Into<String>, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Message) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self::new(component, method, Arc::new(handler))
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn handler(&self) -> &MessageHandler {
        &self.handler
    }

    pub fn invoke(&self, message: &Message) -> Result<(), HandlerError> {
        (self.handler)(message)
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.component, self.method)
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerRef({}::{})", self.component, self.method)
    }
}

/// Inventory entry for a component compiled into the binary
pub struct ComponentEntry {
    pub name: &'static str,
    pub factory: fn() -> Arc<dyn ListenerComponent>,
}

inventory::collect!(ComponentEntry);

/// Register a component for discovery
///
/// ```rust,ignore
/// rabbit_listeners::listener_component!("orders", || std::sync::Arc::new(Orders::default()));
/// ```
#[macro_export]
macro_rules! listener_component {
    ($name:expr, $factory:expr) => {
        $crate::inventory::submit! {
            $crate::listener::component::ComponentEntry {
                name: $name,
                factory: $factory,
            }
        }
    };
}

/// All submitted components, sorted by name
///
/// Link order decides inventory iteration order, so entries are sorted to
/// keep container startup order reproducible.
pub fn discover_components() -> Vec<&'static ComponentEntry> {
    let mut entries: Vec<&'static ComponentEntry> = inventory::iter::<ComponentEntry>
        .into_iter()
        .collect();
    entries.sort_by_key(|entry| entry.name);
    entries
}
