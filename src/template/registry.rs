//! Level-scoped placeholder resolver maps.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::scope::{DocumentScope, ObjectScope, PropertyScope, Scope, TextScope};
use crate::model::{Delta, Op};

/// Nesting level a template is expanded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Document,
    Text,
    Object,
    Property,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Document => write!(f, "document"),
            Level::Text => write!(f, "text"),
            Level::Object => write!(f, "object"),
            Level::Property => write!(f, "property"),
        }
    }
}

/// Produces the replacement op for one placeholder.
pub type Resolver<S> = Arc<dyn Fn(&S) -> Op + Send + Sync>;

/// Placeholder name to resolver map for one level.
pub struct Resolvers<S> {
    map: HashMap<String, Resolver<S>>,
}

impl<S> Resolvers<S> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Register a resolver, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, resolver: F)
    where
        F: Fn(&S) -> Op + Send + Sync + 'static,
    {
        self.map.insert(name.into(), Arc::new(resolver));
    }

    /// Look up a resolver.
    pub fn get(&self, name: &str) -> Option<&Resolver<S>> {
        self.map.get(name)
    }

    /// Check if a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered resolvers.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no resolvers are registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<S> Clone for Resolvers<S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<S> Default for Resolvers<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// The four level-scoped resolver maps used by an export run.
///
/// Names are only resolved at the level they are registered for; the same
/// name at another level stays an inert placeholder op.
#[derive(Clone, Default)]
pub struct PlaceholderRegistry {
    pub document: Resolvers<DocumentScope>,
    pub text: Resolvers<TextScope>,
    pub object: Resolvers<ObjectScope>,
    pub property: Resolvers<PropertyScope>,
}

impl PlaceholderRegistry {
    /// Create a registry without any resolvers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in resolvers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        super::placeholders::register_defaults(&mut registry);
        registry
    }

    /// Check if a name is registered at the given level.
    pub fn is_registered(&self, level: Level, name: &str) -> bool {
        match level {
            Level::Document => self.document.contains(name),
            Level::Text => self.text.contains(name),
            Level::Object => self.object.contains(name),
            Level::Property => self.property.contains(name),
        }
    }

    /// Registered names at the given level, sorted.
    pub fn names(&self, level: Level) -> Vec<&str> {
        match level {
            Level::Document => self.document.names(),
            Level::Text => self.text.names(),
            Level::Object => self.object.names(),
            Level::Property => self.property.names(),
        }
    }

    /// Expand a template at the level of the given scope.
    pub fn expand<S: Scope>(&self, template: &Delta, scope: &S) -> Delta {
        super::expand::expand(template, S::resolvers(self), scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut resolvers: Resolvers<u32> = Resolvers::new();
        resolvers.register("double", |n: &u32| Op::text((n * 2).to_string()));
        assert!(resolvers.contains("double"));
        assert!(!resolvers.contains("triple"));

        let op = (resolvers.get("double").unwrap())(&21);
        assert_eq!(op.as_text(), Some("42"));
    }

    #[test]
    fn test_defaults_are_level_scoped() {
        let registry = PlaceholderRegistry::with_defaults();
        assert!(registry.is_registered(Level::Document, "texts"));
        assert!(!registry.is_registered(Level::Text, "texts"));
        assert!(registry.is_registered(Level::Text, "content"));
        assert!(registry.is_registered(Level::Object, "citations"));
        assert!(registry.is_registered(Level::Property, "value"));
        assert!(!registry.is_registered(Level::Property, "content"));
    }
}
