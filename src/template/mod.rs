//! Placeholder templates.
//!
//! A template is a [`Delta`](crate::model::Delta) whose placeholder ops name
//! slots to fill. Each of the four levels (document, text, object, property)
//! has its own resolver map and its own scope type; expansion at one level
//! never sees resolvers from another.

mod expand;
mod placeholders;
mod registry;
mod scope;

pub use expand::{expand, strip_newlines};
pub use placeholders::letter_spaced;
pub use registry::{Level, PlaceholderRegistry, Resolver, Resolvers};
pub use scope::{DocumentScope, ObjectScope, PropertyScope, Scope, TextScope};
