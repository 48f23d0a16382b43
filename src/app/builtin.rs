//! Built-in listeners shipped with the binary

use crate::broker::Message;
use crate::listener::{HandlerError, ListenerComponent, ListenerDeclaration, ListenerMethod};
use std::sync::Arc;

/// Queue the echo listener consumes unless `echo.queue` is set
pub const ECHO_QUEUE: &str = "echo";

/// Logs every message it receives
#[derive(Debug, Default)]
pub struct EchoListener;

impl EchoListener {
    fn on_message(message: &Message) -> Result<(), HandlerError> {
        if message.body().is_empty() {
            return Err(HandlerError::new("empty message body"));
        }
        log::info!("[{}] {}", message.queue(), message.body_text());
        Ok(())
    }
}

impl ListenerComponent for EchoListener {
    fn name(&self) -> &str {
        "echo"
    }

    fn listener_methods(&self) -> Vec<ListenerMethod> {
        vec![ListenerMethod::new("on_message", Self::on_message).listen(
            ListenerDeclaration::new([format!("${{echo.queue:{}}}", ECHO_QUEUE)])
                .with_id("echo"),
        )]
    }
}

crate::listener_component!("echo", || Arc::new(EchoListener));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_rejects_empty_body() {
        assert!(EchoListener::on_message(&Message::new("echo", "hi")).is_ok());
        assert!(EchoListener::on_message(&Message::new("echo", "")).is_err());
    }

    #[test]
    fn test_echo_is_discovered() {
        let names: Vec<&str> = crate::listener::discover_components()
            .iter()
            .map(|entry| entry.name)
            .collect();
        assert!(names.contains(&"echo"));
    }
}
