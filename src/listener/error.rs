//! Listener Error Types
//!
//! Errors raised while discovering listener declarations, resolving their
//! queues and driving container lifecycles.

use std::fmt;

/// Errors produced by the listener pipeline and the endpoint registry
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Structurally invalid declaration or registry misuse
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A queue reference could not be turned into a name or queue object
    #[error("Cannot resolve queue reference '{reference}': {reason}")]
    Resolution { reference: String, reason: String },

    /// A factory or container failed while the registry was starting
    #[error("Container for endpoint '{endpoint_id}' failed to start: {source}")]
    ContainerStart {
        endpoint_id: String,
        #[source]
        source: ContainerError,
    },

    /// One or more containers failed to stop
    #[error("{} container(s) failed to stop: {}", failures.len(), StopFailures(failures))]
    ContainerStop { failures: Vec<StopFailure> },
}

impl ListenerError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        ListenerError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn resolution(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        ListenerError::Resolution {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}

/// A single container stop failure, collected during `EndpointRegistry::stop`
#[derive(Debug)]
pub struct StopFailure {
    pub endpoint_id: String,
    pub error: ContainerError,
}

struct StopFailures<'a>(&'a [StopFailure]);

impl fmt::Display for StopFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} ({})", failure.endpoint_id, failure.error)?;
        }
        Ok(())
    }
}

/// Error reported by a container or container factory
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ContainerError {
    pub message: String,
}

impl ContainerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error returned by a message handler
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl crate::core::error_handling::ContextualError for ListenerError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ListenerError::Configuration { .. } | ListenerError::Resolution { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ListenerError::Configuration { message } => Some(message),
            ListenerError::Resolution { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Result type for listener operations
pub type ListenerResult<T> = Result<T, ListenerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error_handling::ContextualError;

    #[test]
    fn test_stop_error_lists_every_failure() {
        let err = ListenerError::ContainerStop {
            failures: vec![
                StopFailure {
                    endpoint_id: "a".to_string(),
                    error: ContainerError::new("boom"),
                },
                StopFailure {
                    endpoint_id: "b".to_string(),
                    error: ContainerError::new("bang"),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "2 container(s) failed to stop: a (boom); b (bang)"
        );
    }

    #[test]
    fn test_user_actionable_classification() {
        let config = ListenerError::configuration("no queues declared");
        assert!(config.is_user_actionable());
        assert_eq!(config.user_message(), Some("no queues declared"));

        let start = ListenerError::ContainerStart {
            endpoint_id: "x".to_string(),
            source: ContainerError::new("refused"),
        };
        assert!(!start.is_user_actionable());
        assert_eq!(start.user_message(), None);
    }
}
