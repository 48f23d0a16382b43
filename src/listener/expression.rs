//! Indirect Reference Evaluation
//!
//! Indirect queue references (`#{...}`) are handed to an
//! [`ExpressionEvaluator`]. The default [`ReferenceEvaluator`] understands a
//! small reference language:
//!
//! - `@name` or `ref:name` - the named object itself
//! - `@name.name` - the name of a named queue (also `durable`, `exclusive`,
//!   `auto_delete`)
//! - `'text'` - a quoted literal
//!
//! Any closure `Fn(&str, &dyn ObjectGraph) -> ListenerResult<Value>` is also an
//! evaluator, which keeps tests free to stub resolution.

use crate::context::graph::{ObjectGraph, Value};
use crate::listener::error::{ListenerError, ListenerResult};

/// Evaluates the interior of an indirect reference against the object graph
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, graph: &dyn ObjectGraph) -> ListenerResult<Value>;
}

impl<F> ExpressionEvaluator for F
where
    F: Fn(&str, &dyn ObjectGraph) -> ListenerResult<Value> + Send + Sync,
{
    fn evaluate(&self, expression: &str, graph: &dyn ObjectGraph) -> ListenerResult<Value> {
        self(expression, graph)
    }
}

/// Default evaluator for named-object references
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEvaluator;

impl ReferenceEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn property(expression: &str, object: &Value, property: &str) -> ListenerResult<Value> {
        let queue = match object {
            Value::Queue(queue) => queue,
            other => {
                return Err(ListenerError::resolution(
                    expression,
                    format!("{} object has no property '{}'", other.type_name(), property),
                ))
            }
        };

        match property {
            "name" => Ok(Value::Text(queue.name().to_string())),
            "durable" => Ok(Value::Boolean(queue.is_durable())),
            "exclusive" => Ok(Value::Boolean(queue.is_exclusive())),
            "auto_delete" | "autoDelete" => Ok(Value::Boolean(queue.is_auto_delete())),
            _ => Err(ListenerError::resolution(
                expression,
                format!("queue has no property '{}'", property),
            )),
        }
    }
}

impl ExpressionEvaluator for ReferenceEvaluator {
    fn evaluate(&self, expression: &str, graph: &dyn ObjectGraph) -> ListenerResult<Value> {
        let trimmed = expression.trim();

        if let Some(literal) = trimmed
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return Ok(Value::Text(literal.to_string()));
        }

        let reference = trimmed
            .strip_prefix('@')
            .or_else(|| trimmed.strip_prefix("ref:"))
            .ok_or_else(|| {
                ListenerError::resolution(expression, "unsupported expression, expected @name or ref:name")
            })?;

        let (object_name, property) = match reference.split_once('.') {
            Some((object_name, property)) => (object_name.trim(), Some(property.trim())),
            None => (reference.trim(), None),
        };

        if object_name.is_empty() {
            return Err(ListenerError::resolution(expression, "missing object name"));
        }

        let object = graph.lookup(object_name).ok_or_else(|| {
            ListenerError::resolution(expression, format!("no object named '{}'", object_name))
        })?;

        match property {
            None => Ok(object.clone()),
            Some(property) => Self::property(expression, object, property),
        }
    }
}
