//! Project corpus: texts, objects and formats the export reads from.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::delta::{Delta, FormatId, ObjectId, TextId, DEFAULT_FORMAT_ID};
use super::property::{PropertyId, PropertyValue, SchemeProperty};
use super::style::{CharacterStyle, ParagraphFormat};
use crate::error::{Error, Result};

/// Project-wide metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    pub name: String,
    pub author: Option<String>,
}

/// A text (chapter, scene, note) with its rich-text body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub id: TextId,
    pub name: String,
    pub created: DateTime<Utc>,
    pub changed: DateTime<Utc>,

    #[serde(default = "default_true")]
    pub editable: bool,

    /// Checked in the text tree
    #[serde(default)]
    pub checked: bool,

    #[serde(default)]
    pub delta: Delta,
}

fn default_true() -> bool {
    true
}

impl Text {
    /// Create an unchecked text with the given body.
    pub fn new(id: impl Into<TextId>, name: impl Into<String>, delta: Delta) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            created: now,
            changed: now,
            editable: true,
            checked: false,
            delta,
        }
    }

    /// Mark the text as checked.
    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }
}

/// A domain object (character, location, item) with scheme-based properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    pub name: String,

    /// Parent in the object tree
    #[serde(default)]
    pub parent: Option<ObjectId>,

    /// Checked in the object tree
    #[serde(default)]
    pub checked: bool,

    /// Property definitions declared on this object
    #[serde(default)]
    pub scheme: Vec<SchemeProperty>,

    /// Property values, keyed by property id
    #[serde(default)]
    pub values: IndexMap<PropertyId, PropertyValue>,

    /// Styling applied to text spans referencing this object
    #[serde(default)]
    pub style: CharacterStyle,
}

impl Object {
    /// Create an unchecked root object.
    pub fn new(id: impl Into<ObjectId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: None,
            checked: false,
            scheme: Vec::new(),
            values: IndexMap::new(),
            style: CharacterStyle::default(),
        }
    }

    /// Set the parent object.
    pub fn with_parent(mut self, parent: impl Into<ObjectId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Mark the object as checked.
    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    /// Declare a scheme property.
    pub fn with_property(mut self, property: SchemeProperty) -> Self {
        self.scheme.push(property);
        self
    }

    /// Set a property value.
    pub fn with_value(mut self, id: impl Into<PropertyId>, value: PropertyValue) -> Self {
        self.values.insert(id.into(), value);
        self
    }

    /// Set the span style.
    pub fn with_style(mut self, style: CharacterStyle) -> Self {
        self.style = style;
        self
    }
}

/// A named, ordered subset of texts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    pub texts: Vec<TextId>,
}

/// Read-only access to the corpus an export run draws from.
///
/// Texts and objects are returned in natural tree order.
pub trait ProjectSource {
    /// Project metadata.
    fn info(&self) -> &ProjectInfo;

    /// All texts in tree order.
    fn texts(&self) -> Vec<&Text>;

    /// All objects in tree order.
    fn objects(&self) -> Vec<&Object>;

    /// Look up a text.
    fn text(&self, id: &str) -> Option<&Text>;

    /// Look up an object.
    fn object(&self, id: &str) -> Option<&Object>;

    /// Look up a paragraph format.
    fn format(&self, id: &str) -> Option<&ParagraphFormat>;

    /// The active text collection, if the user is working inside one.
    fn active_collection(&self) -> Option<&Collection> {
        None
    }

    /// Texts of the active corpus: the active collection, or the whole tree.
    fn corpus_texts(&self) -> Vec<&Text> {
        match self.active_collection() {
            Some(collection) => collection
                .texts
                .iter()
                .filter_map(|id| self.text(id))
                .collect(),
            None => self.texts(),
        }
    }

    /// Ancestor chain of an object, nearest first, starting with the object itself.
    fn ancestry(&self, id: &str) -> Vec<&Object> {
        let mut chain: Vec<&Object> = Vec::new();
        let mut current = self.object(id);
        while let Some(object) = current {
            if chain.iter().any(|o| o.id == object.id) {
                log::warn!("Cycle in object tree at {}", object.id);
                break;
            }
            chain.push(object);
            current = object.parent.as_deref().and_then(|p| self.object(p));
        }
        chain
    }
}

/// In-memory project, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub info: ProjectInfo,
    pub texts: Vec<Text>,
    pub objects: Vec<Object>,
    pub formats: Vec<ParagraphFormat>,
    pub active_collection: Option<Collection>,
}

impl Project {
    /// Create an empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ProjectInfo {
                name: name.into(),
                author: None,
            },
            ..Default::default()
        }
    }

    /// Parse a project from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a project from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Add a text at the end of the tree.
    pub fn add_text(&mut self, text: Text) {
        self.texts.push(text);
    }

    /// Add an object at the end of the tree.
    pub fn add_object(&mut self, object: Object) {
        self.objects.push(object);
    }

    /// Add a paragraph format.
    pub fn add_format(&mut self, format: ParagraphFormat) {
        self.formats.push(format);
    }

    /// Check that every text, object and format reference resolves.
    ///
    /// Exports tolerate dangling references; this reports the first one.
    pub fn validate(&self) -> Result<()> {
        if let Some(collection) = &self.active_collection {
            if let Some(id) = collection.texts.iter().find(|id| self.text(id).is_none()) {
                return Err(Error::MissingText(id.clone()));
            }
        }

        for object in &self.objects {
            if let Some(parent) = &object.parent {
                if self.object(parent).is_none() {
                    return Err(Error::MissingObject(parent.clone()));
                }
            }
            for value in object.values.values() {
                if let PropertyValue::Relation(ids) = value {
                    if let Some(id) = ids.iter().find(|id| self.object(id).is_none()) {
                        return Err(Error::MissingObject(id.clone()));
                    }
                }
            }
        }

        for text in &self.texts {
            for op in &text.delta.ops {
                if let Some(id) = op.attributes.objects().find(|id| self.object(id).is_none()) {
                    return Err(Error::MissingObject(id.to_string()));
                }
                if let Some(id) = op.attributes.format() {
                    if id != DEFAULT_FORMAT_ID && self.format(id).is_none() {
                        return Err(Error::MissingFormat(id.to_string()));
                    }
                }
            }
        }
        Ok(())
    }
}

impl ProjectSource for Project {
    fn info(&self) -> &ProjectInfo {
        &self.info
    }

    fn texts(&self) -> Vec<&Text> {
        self.texts.iter().collect()
    }

    fn objects(&self) -> Vec<&Object> {
        self.objects.iter().collect()
    }

    fn text(&self, id: &str) -> Option<&Text> {
        self.texts.iter().find(|t| t.id == id)
    }

    fn object(&self, id: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.id == id)
    }

    fn format(&self, id: &str) -> Option<&ParagraphFormat> {
        self.formats.iter().find(|f| f.id == id)
    }

    fn active_collection(&self) -> Option<&Collection> {
        self.active_collection.as_ref()
    }
}

/// Resolve a paragraph format, falling back to the standard format.
pub fn resolve_format<S: ProjectSource + ?Sized>(source: &S, id: &str) -> ParagraphFormat {
    match source.format(id) {
        Some(format) => format.clone(),
        None => {
            if id != DEFAULT_FORMAT_ID {
                log::warn!("Unknown paragraph format {}, using standard", id);
            }
            let mut standard = source
                .format(DEFAULT_FORMAT_ID)
                .cloned()
                .unwrap_or_else(ParagraphFormat::standard);
            standard.id = FormatId::from(DEFAULT_FORMAT_ID);
            standard
        }
    }
}
