//! Marker (meta-declaration) Resolution
//!
//! A marker is a named, reusable listener definition. Applying a marker to a
//! method is equivalent to declaring the marker's embedded declaration on it.
//! Markers may themselves be marked with other markers; the chain is followed
//! until the embedded declarations are found, and exactly one is allowed.

use crate::listener::component::ListenerMethod;
use crate::listener::declaration::ListenerDeclaration;
use crate::listener::error::{ListenerError, ListenerResult};
use std::collections::{HashMap, HashSet};

/// Definition of one marker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerDefinition {
    declarations: Vec<ListenerDeclaration>,
    markers: Vec<String>,
}

impl MarkerDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marker embedding a single declaration
    pub fn declaring(declaration: ListenerDeclaration) -> Self {
        Self::new().with_declaration(declaration)
    }

    pub fn with_declaration(mut self, declaration: ListenerDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Mark this marker with another marker
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn declarations(&self) -> &[ListenerDeclaration] {
        &self.declarations
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

/// Table of known markers
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    markers: HashMap<String, MarkerDefinition>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a marker
    pub fn define(&mut self, id: impl Into<String>, definition: MarkerDefinition) {
        self.markers.insert(id.into(), definition);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.markers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// The declaration a marker carries, following the marker chain
    ///
    /// Returns `Ok(None)` for markers that carry no declaration at all; such
    /// markers do not make a method a listener.
    pub fn embedded_declaration(&self, id: &str) -> ListenerResult<Option<ListenerDeclaration>> {
        let mut path = Vec::new();
        let mut found = Vec::new();
        self.collect_declarations(id, &mut path, &mut found)?;

        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            n => Err(ListenerError::configuration(format!(
                "Marker '{}' carries {} listener declarations, expected exactly one",
                id, n
            ))),
        }
    }

    fn collect_declarations(
        &self,
        id: &str,
        path: &mut Vec<String>,
        found: &mut Vec<ListenerDeclaration>,
    ) -> ListenerResult<()> {
        if path.iter().any(|seen| seen == id) {
            path.push(id.to_string());
            return Err(ListenerError::configuration(format!(
                "Marker cycle detected: {}",
                path.join(" -> ")
            )));
        }

        let definition = self.markers.get(id).ok_or_else(|| {
            ListenerError::configuration(format!("Unknown listener marker '{}'", id))
        })?;

        found.extend(definition.declarations.iter().cloned());

        path.push(id.to_string());
        for marker in &definition.markers {
            self.collect_declarations(marker, path, found)?;
        }
        path.pop();
        Ok(())
    }

    /// Declarations applying to a method: one per marker in the order the
    /// markers were applied, then the direct declaration.
    pub fn effective_declarations(
        &self,
        method: &ListenerMethod,
    ) -> ListenerResult<Vec<ListenerDeclaration>> {
        let mut seen = HashSet::new();
        let mut declarations = Vec::new();

        for marker in method.markers() {
            if !seen.insert(marker.as_str()) {
                return Err(ListenerError::configuration(format!(
                    "Marker '{}' applied more than once on method '{}'",
                    marker,
                    method.name()
                )));
            }
            if let Some(declaration) = self.embedded_declaration(marker)? {
                log::trace!(
                    "Marker '{}' on '{}' contributes queues {:?}",
                    marker,
                    method.name(),
                    declaration.queues()
                );
                declarations.push(declaration);
            }
        }

        if let Some(direct) = method.declaration() {
            declarations.push(direct.clone());
        }

        Ok(declarations)
    }

    /// Single declaration the method listens with, if any
    ///
    /// Queue references are concatenated marker-first. Attributes set on the
    /// direct declaration win; otherwise the first marker setting one wins.
    pub fn merged_declaration(
        &self,
        method: &ListenerMethod,
    ) -> ListenerResult<Option<ListenerDeclaration>> {
        let mut declarations = self.effective_declarations(method)?;
        let direct = match method.declaration() {
            Some(_) => declarations.pop(),
            None => None,
        };

        let meta = declarations
            .into_iter()
            .reduce(|merged, next| merged.merge(&next));

        Ok(match (meta, direct) {
            (None, None) => None,
            (Some(meta), None) => Some(meta),
            (None, Some(direct)) => Some(direct),
            (Some(meta), Some(direct)) => Some(meta.merge(&direct).override_attributes(&direct)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str) -> ListenerMethod {
        ListenerMethod::new(name, |_| Ok(()))
    }

    fn registry_with_foo() -> MarkerRegistry {
        let mut registry = MarkerRegistry::new();
        registry.define(
            "FooListener",
            MarkerDefinition::declaring(ListenerDeclaration::new(["metaTestQueue"])),
        );
        registry
    }

    #[test]
    fn test_marker_only_method() {
        let registry = registry_with_foo();
        let method = method("handleIt").marked("FooListener");

        let merged = registry.merged_declaration(&method).unwrap().unwrap();
        assert_eq!(merged.queues(), &["metaTestQueue"]);
    }

    #[test]
    fn test_marker_queues_precede_direct_queues() {
        let registry = registry_with_foo();
        let method = method("handleIt")
            .marked("FooListener")
            .listen(ListenerDeclaration::new(["testQueue"]).with_container_factory("f"));

        let effective = registry.effective_declarations(&method).unwrap();
        assert_eq!(effective.len(), 2);
        assert_eq!(effective[0].queues(), &["metaTestQueue"]);
        assert_eq!(effective[1].queues(), &["testQueue"]);

        let merged = registry.merged_declaration(&method).unwrap().unwrap();
        assert_eq!(merged.queues(), &["metaTestQueue", "testQueue"]);
        assert_eq!(merged.container_factory(), Some("f"));
    }

    #[test]
    fn test_direct_attributes_override_marker_attributes() {
        let mut registry = MarkerRegistry::new();
        registry.define(
            "Prioritised",
            MarkerDefinition::declaring(
                ListenerDeclaration::new(["a"])
                    .with_priority(10)
                    .with_exclusive(true),
            ),
        );
        let method = method("m")
            .marked("Prioritised")
            .listen(ListenerDeclaration::new(["b"]).with_priority(1));

        let merged = registry.merged_declaration(&method).unwrap().unwrap();
        assert_eq!(merged.priority(), Some(1));
        assert!(merged.exclusive());
    }

    #[test]
    fn test_transitive_marker_chain() {
        let mut registry = registry_with_foo();
        registry.define("Composed", MarkerDefinition::new().with_marker("FooListener"));

        let declaration = registry.embedded_declaration("Composed").unwrap().unwrap();
        assert_eq!(declaration.queues(), &["metaTestQueue"]);
    }

    #[test]
    fn test_ambiguous_marker_is_rejected() {
        let mut registry = MarkerRegistry::new();
        registry.define(
            "Twice",
            MarkerDefinition::new()
                .with_declaration(ListenerDeclaration::new(["a"]))
                .with_declaration(ListenerDeclaration::new(["b"])),
        );

        let err = registry.embedded_declaration("Twice").unwrap_err();
        assert!(matches!(err, ListenerError::Configuration { .. }));
    }

    #[test]
    fn test_ambiguity_through_chain_is_rejected() {
        let mut registry = registry_with_foo();
        registry.define(
            "Both",
            MarkerDefinition::declaring(ListenerDeclaration::new(["other"])).with_marker("FooListener"),
        );

        assert!(registry.embedded_declaration("Both").is_err());
    }

    #[test]
    fn test_repeated_marker_is_rejected() {
        let registry = registry_with_foo();
        let method = method("m").marked("FooListener").marked("FooListener");

        let err = registry.effective_declarations(&method).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_unknown_marker_is_rejected() {
        let registry = MarkerRegistry::new();
        let method = method("m").marked("Missing");
        assert!(registry.merged_declaration(&method).is_err());
    }

    #[test]
    fn test_marker_cycle_is_rejected() {
        let mut registry = MarkerRegistry::new();
        registry.define("A", MarkerDefinition::new().with_marker("B"));
        registry.define("B", MarkerDefinition::new().with_marker("A"));

        let err = registry.embedded_declaration("A").unwrap_err();
        assert!(err.to_string().contains("A -> B -> A"));
    }

    #[test]
    fn test_marker_without_declaration_is_ignored() {
        let mut registry = MarkerRegistry::new();
        registry.define("Documented", MarkerDefinition::new());
        let method = method("m").marked("Documented");

        assert_eq!(registry.merged_declaration(&method).unwrap(), None);
    }

    #[test]
    fn test_plain_method_has_no_declaration() {
        let registry = registry_with_foo();
        assert_eq!(registry.merged_declaration(&method("m")).unwrap(), None);
    }
}
