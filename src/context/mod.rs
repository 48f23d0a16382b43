//! Listener Host Context
//!
//! The [`ApplicationContext`] plays the host's part for the listener
//! pipeline: it owns the named object graph, the components, the marker
//! definitions and the endpoint registry, and drives them through
//! `refresh()` and `close()`.

mod application;
pub mod graph;

pub use application::ApplicationContext;
pub use graph::{ObjectGraph, Queue, Value};
