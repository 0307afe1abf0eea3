//! Values visible to resolvers at each template level.
//!
//! Scopes own their data so a resolver registry can be shared across runs.
//! Block-level fields (`texts`, `content`, `properties`, ...) hold fragments
//! already rendered in the target format.

use chrono::{DateTime, Utc};

use super::registry::{Level, PlaceholderRegistry, Resolvers};
use crate::model::{ExportFormat, ObjectId, Op, PropertyKind, TextId};
use crate::render::ExportStats;

/// A value resolvers can be evaluated against.
pub trait Scope: Sized + 'static {
    /// Level this scope belongs to.
    const LEVEL: Level;

    /// The resolver map for this level.
    fn resolvers(registry: &PlaceholderRegistry) -> &Resolvers<Self>;
}

/// Scope of the document template.
#[derive(Debug, Clone)]
pub struct DocumentScope {
    pub format: ExportFormat,
    pub project: String,
    pub author: Option<String>,
    /// Rendered block of all exported texts
    pub texts: String,
    /// Rendered block of all exported objects
    pub objects: String,
    pub stats: ExportStats,
    pub exported_at: DateTime<Utc>,
    pub date_format: String,
}

/// Scope of the text template.
#[derive(Debug, Clone)]
pub struct TextScope {
    pub format: ExportFormat,
    pub id: TextId,
    pub name: String,
    pub created: DateTime<Utc>,
    pub changed: DateTime<Utc>,
    /// Rendered text body
    pub content: String,
    pub word_count: u32,
    pub date_format: String,
}

/// Scope of the object, object-start and object-end templates.
#[derive(Debug, Clone)]
pub struct ObjectScope {
    pub format: ExportFormat,
    pub id: ObjectId,
    pub name: String,
    /// Ancestor names, root first, joined with " / "
    pub path: String,
    /// Rendered block of all properties
    pub properties: String,
    /// Rendered citation list
    pub citations: String,
}

impl ObjectScope {
    /// Scope for object start/end wrappers, which carry no block content.
    pub fn wrapper(format: ExportFormat, id: impl Into<ObjectId>, name: impl Into<String>) -> Self {
        Self {
            format,
            id: id.into(),
            name: name.into(),
            path: String::new(),
            properties: String::new(),
            citations: String::new(),
        }
    }
}

/// Scope of the property template.
#[derive(Debug, Clone)]
pub struct PropertyScope {
    pub format: ExportFormat,
    pub id: String,
    pub name: String,
    pub kind: PropertyKind,
    /// Value op: plain text for inline values, cooked block otherwise
    pub value: Op,
}

impl Scope for DocumentScope {
    const LEVEL: Level = Level::Document;

    fn resolvers(registry: &PlaceholderRegistry) -> &Resolvers<Self> {
        &registry.document
    }
}

impl Scope for TextScope {
    const LEVEL: Level = Level::Text;

    fn resolvers(registry: &PlaceholderRegistry) -> &Resolvers<Self> {
        &registry.text
    }
}

impl Scope for ObjectScope {
    const LEVEL: Level = Level::Object;

    fn resolvers(registry: &PlaceholderRegistry) -> &Resolvers<Self> {
        &registry.object
    }
}

impl Scope for PropertyScope {
    const LEVEL: Level = Level::Property;

    fn resolvers(registry: &PlaceholderRegistry) -> &Resolvers<Self> {
        &registry.property
    }
}
