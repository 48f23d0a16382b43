//! Queue Reference Resolution
//!
//! Turns raw queue reference strings into ordered lists of literal queue
//! names and queue objects. A reference is split on top-level commas (the
//! interior of `#{...}` and `${...}` is opaque), each sub-part is trimmed,
//! `${key}` / `${key:default}` placeholders are substituted from the graph's
//! properties, and `#{...}` expressions are handed to the configured
//! [`ExpressionEvaluator`].

use crate::context::graph::{ObjectGraph, Queue, Value};
use crate::listener::error::{ListenerError, ListenerResult};
use crate::listener::expression::{ExpressionEvaluator, ReferenceEvaluator};
use std::sync::Arc;

/// One resolved entry of a queue reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedQueue {
    /// Literal queue name
    Name(String),
    /// Named queue object from the graph
    Queue(Queue),
}

impl ResolvedQueue {
    /// Name of the queue regardless of the entry kind
    pub fn queue_name(&self) -> &str {
        match self {
            ResolvedQueue::Name(name) => name,
            ResolvedQueue::Queue(queue) => queue.name(),
        }
    }
}

/// Resolves queue references with a pluggable evaluator
#[derive(Clone)]
pub struct QueueReferenceResolver {
    evaluator: Arc<dyn ExpressionEvaluator>,
}

impl std::fmt::Debug for QueueReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueReferenceResolver").finish_non_exhaustive()
    }
}

impl Default for QueueReferenceResolver {
    fn default() -> Self {
        Self::new(Arc::new(ReferenceEvaluator::new()))
    }
}

impl QueueReferenceResolver {
    pub fn new(evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Resolve every reference of a declaration, one list per reference
    ///
    /// The first failing reference aborts resolution of the whole set.
    pub fn resolve_all(
        &self,
        references: &[String],
        graph: &dyn ObjectGraph,
    ) -> ListenerResult<Vec<Vec<ResolvedQueue>>> {
        references
            .iter()
            .map(|reference| self.resolve(reference, graph))
            .collect()
    }

    /// Resolve a single raw reference string, preserving left-to-right order
    pub fn resolve(&self, reference: &str, graph: &dyn ObjectGraph) -> ListenerResult<Vec<ResolvedQueue>> {
        split_top_level(reference)?
            .into_iter()
            .map(|part| self.resolve_part(reference, part.trim(), graph))
            .collect()
    }

    fn resolve_part(
        &self,
        reference: &str,
        part: &str,
        graph: &dyn ObjectGraph,
    ) -> ListenerResult<ResolvedQueue> {
        if part.is_empty() {
            return Err(ListenerError::resolution(reference, "empty queue reference"));
        }

        let part = substitute_placeholders(reference, part, graph)?;
        let part = part.trim();

        let resolved = if let Some(expression) = whole_expression(part) {
            match self.evaluator.evaluate(expression, graph)? {
                Value::Text(name) => ResolvedQueue::Name(name),
                Value::Queue(queue) => ResolvedQueue::Queue(queue),
                other => {
                    return Err(ListenerError::resolution(
                        reference,
                        format!(
                            "'{}' resolved to {} '{}', expected a queue name or queue",
                            part,
                            other.type_name(),
                            other
                        ),
                    ))
                }
            }
        } else if part.contains("#{") {
            ResolvedQueue::Name(self.evaluate_template(reference, part, graph)?)
        } else {
            ResolvedQueue::Name(part.to_string())
        };

        if resolved.queue_name().is_empty() {
            return Err(ListenerError::resolution(
                reference,
                format!("'{}' resolved to an empty queue name", part),
            ));
        }

        log::trace!("Queue reference part '{}' resolved to {:?}", part, resolved);
        Ok(resolved)
    }

    /// Literal text with embedded expressions; every expression must produce text
    fn evaluate_template(
        &self,
        reference: &str,
        part: &str,
        graph: &dyn ObjectGraph,
    ) -> ListenerResult<String> {
        let mut output = String::new();
        let mut rest = part;

        while let Some(start) = rest.find("#{") {
            output.push_str(&rest[..start]);
            let body_start = start + 2;
            let end = find_closing(rest, body_start)
                .ok_or_else(|| ListenerError::resolution(reference, "unterminated expression"))?;

            match self.evaluator.evaluate(&rest[body_start..end], graph)? {
                Value::Queue(queue) => {
                    return Err(ListenerError::resolution(
                        reference,
                        format!(
                            "queue '{}' cannot be embedded in the text '{}'",
                            queue.name(),
                            part
                        ),
                    ))
                }
                value => output.push_str(&value.to_string()),
            }
            rest = &rest[end + 1..];
        }

        output.push_str(rest);
        Ok(output)
    }
}

/// Split on commas outside `#{...}` / `${...}`
fn split_top_level(reference: &str) -> ListenerResult<Vec<&str>> {
    let bytes = reference.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' | b'$' if bytes.get(i + 1) == Some(&b'{') => {
                depth += 1;
                i += 1;
            }
            b'{' if depth > 0 => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b',' if depth == 0 => {
                parts.push(&reference[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if depth > 0 {
        return Err(ListenerError::resolution(reference, "unterminated expression"));
    }

    parts.push(&reference[start..]);
    Ok(parts)
}

/// Index of the `}` closing a block whose body starts at `body_start`
fn find_closing(text: &str, body_start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, byte) in text.as_bytes()[body_start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(body_start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Interior of `part` if it is exactly one `#{...}` expression
fn whole_expression(part: &str) -> Option<&str> {
    if !part.starts_with("#{") {
        return None;
    }
    let end = find_closing(part, 2)?;
    if end == part.len() - 1 {
        Some(&part[2..end])
    } else {
        None
    }
}

fn substitute_placeholders(
    reference: &str,
    part: &str,
    graph: &dyn ObjectGraph,
) -> ListenerResult<String> {
    let mut output = String::new();
    let mut rest = part;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let body_start = start + 2;
        let end = find_closing(rest, body_start)
            .ok_or_else(|| ListenerError::resolution(reference, "unterminated placeholder"))?;
        let body = &rest[body_start..end];

        let (key, default) = match body.split_once(':') {
            Some((key, default)) => (key.trim(), Some(default)),
            None => (body.trim(), None),
        };

        match graph.property(key).or(default) {
            Some(value) => output.push_str(value),
            None => {
                return Err(ListenerError::resolution(
                    reference,
                    format!("no property '{}' for placeholder", key),
                ))
            }
        }
        rest = &rest[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}
