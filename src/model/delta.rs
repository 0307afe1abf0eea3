//! Delta content model: ordered insert operations with typed attributes.

use serde::{Deserialize, Serialize};

/// Identifier of a paragraph format.
pub type FormatId = String;

/// Identifier of a domain object.
pub type ObjectId = String;

/// Identifier of a text.
pub type TextId = String;

/// Id of the built-in default paragraph format.
pub const DEFAULT_FORMAT_ID: &str = "UUID0";

/// A rich-text document body: an ordered sequence of insert operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Insert operations in document order
    #[serde(default)]
    pub ops: Vec<Op>,
}

impl Delta {
    /// Create an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a delta from a list of ops.
    pub fn from_ops(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// Append an op.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Append an op, builder style.
    pub fn with(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    /// Check if the delta has no ops.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Concatenated text inserts, ignoring images and placeholders.
    pub fn plain_text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| op.insert.as_text())
            .collect()
    }

    /// Check if the delta carries no visible text and no images.
    pub fn is_blank(&self) -> bool {
        self.ops.iter().all(|op| match &op.insert {
            Insert::Text(text) => text.trim().is_empty(),
            Insert::Image { .. } => false,
            Insert::Placeholder { .. } => true,
        })
    }

    /// Object ids referenced by any op, in first-seen order.
    pub fn referenced_objects(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for op in &self.ops {
            for id in op.attributes.objects() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// Check if any op references the given object.
    pub fn references_object(&self, id: &str) -> bool {
        self.ops.iter().any(|op| op.attributes.has_object(id))
    }
}

impl From<Vec<Op>> for Delta {
    fn from(ops: Vec<Op>) -> Self {
        Self::from_ops(ops)
    }
}

/// A single insert operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    /// The inserted payload
    pub insert: Insert,

    /// Formatting attributes
    #[serde(default, skip_serializing_if = "AttributeSet::is_empty")]
    pub attributes: AttributeSet,
}

impl Op {
    /// Create an op with the given payload and no attributes.
    pub fn new(insert: Insert) -> Self {
        Self {
            insert,
            attributes: AttributeSet::new(),
        }
    }

    /// Create a plain text insert.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Insert::Text(text.into()))
    }

    /// Create an image insert.
    pub fn image(image: EmbeddedImage) -> Self {
        Self::new(Insert::Image { image })
    }

    /// Create a placeholder insert naming a template slot.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::new(Insert::Placeholder {
            placeholder: name.into(),
        })
    }

    /// Create an insert of already-rendered target content.
    pub fn cooked(content: impl Into<String>, block: bool) -> Self {
        Self::text(content).with_attribute(Attribute::Cooked(Cooked { block }))
    }

    /// Add an attribute, builder style.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.insert(attribute);
        self
    }

    /// Add an inline style, builder style.
    pub fn with_style(self, style: InlineStyle) -> Self {
        self.with_attribute(Attribute::Style(style))
    }

    /// Attach a paragraph format, builder style.
    pub fn with_format(self, id: impl Into<FormatId>) -> Self {
        self.with_attribute(Attribute::Format(id.into()))
    }

    /// Attach an object reference, builder style.
    pub fn with_object(self, id: impl Into<ObjectId>) -> Self {
        self.with_attribute(Attribute::Object(id.into()))
    }

    /// Text payload, if this is a text insert.
    pub fn as_text(&self) -> Option<&str> {
        self.insert.as_text()
    }

    /// Placeholder name, if this is a placeholder insert.
    pub fn placeholder_name(&self) -> Option<&str> {
        match &self.insert {
            Insert::Placeholder { placeholder } => Some(placeholder),
            _ => None,
        }
    }

    /// Check if this op carries already-rendered content.
    pub fn is_cooked(&self) -> bool {
        self.attributes.cooked().is_some()
    }

    /// Check if this op is cooked block content.
    pub fn is_block(&self) -> bool {
        self.attributes.cooked().is_some_and(|c| c.block)
    }
}

/// Payload of an insert operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insert {
    /// UTF-8 text
    Text(String),

    /// An embedded image
    Image {
        /// Image description
        image: EmbeddedImage,
    },

    /// A template slot, only meaningful during template expansion
    Placeholder {
        /// Slot name
        placeholder: String,
    },
}

impl Insert {
    /// Text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Insert::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// An image embedded in the text flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    /// Image source, usually a `data:` URI
    pub src: String,

    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Optional title / caption
    #[serde(default)]
    pub title: Option<String>,

    /// Alignment in the text flow
    #[serde(default)]
    pub align: ImageAlign,

    /// Draw a drop shadow
    #[serde(default)]
    pub shadow: bool,
}

impl EmbeddedImage {
    /// Create an inline image.
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            src: src.into(),
            width,
            height,
            title: None,
            align: ImageAlign::Inline,
            shadow: false,
        }
    }

    /// Set the alignment.
    pub fn with_align(mut self, align: ImageAlign) -> Self {
        self.align = align;
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Enable the drop shadow.
    pub fn with_shadow(mut self) -> Self {
        self.shadow = true;
        self
    }
}

/// Placement of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageAlign {
    /// Flows with the surrounding text
    #[default]
    Inline,
    /// Own paragraph, left aligned
    Left,
    /// Own paragraph, centered
    Center,
    /// Own paragraph, right aligned
    Right,
}

/// Character-level inline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strike,
}

/// Marker for content already rendered in the target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cooked {
    /// Replaces a whole structural unit rather than an inline fragment
    #[serde(default)]
    pub block: bool,
}

/// A single formatting attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Style(InlineStyle),
    Format(FormatId),
    Object(ObjectId),
    Cooked(Cooked),
}

/// Closed set of attributes attached to an op.
///
/// Holds at most one paragraph format and at most one cooked marker; inline
/// styles and object references are deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(Vec<Attribute>);

impl AttributeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no attributes are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the attributes.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    /// Insert an attribute, replacing an existing format or cooked marker.
    pub fn insert(&mut self, attribute: Attribute) {
        match &attribute {
            Attribute::Format(_) => self.0.retain(|a| !matches!(a, Attribute::Format(_))),
            Attribute::Cooked(_) => self.0.retain(|a| !matches!(a, Attribute::Cooked(_))),
            _ if self.0.contains(&attribute) => return,
            _ => {}
        }
        self.0.push(attribute);
    }

    /// Check if the given inline style is set.
    pub fn has_style(&self, style: InlineStyle) -> bool {
        self.0.contains(&Attribute::Style(style))
    }

    /// Inline styles in canonical order.
    pub fn styles(&self) -> Vec<InlineStyle> {
        let mut styles: Vec<InlineStyle> = self
            .0
            .iter()
            .filter_map(|a| match a {
                Attribute::Style(s) => Some(*s),
                _ => None,
            })
            .collect();
        styles.sort();
        styles.dedup();
        styles
    }

    /// The paragraph format, if any.
    pub fn format(&self) -> Option<&str> {
        self.0.iter().find_map(|a| match a {
            Attribute::Format(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// Remove the paragraph format.
    pub fn remove_format(&mut self) {
        self.0.retain(|a| !matches!(a, Attribute::Format(_)));
    }

    /// Referenced object ids in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|a| match a {
            Attribute::Object(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// Check if the given object is referenced.
    pub fn has_object(&self, id: &str) -> bool {
        self.objects().any(|o| o == id)
    }

    /// Keep only object references accepted by the predicate.
    pub fn retain_objects(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|a| match a {
            Attribute::Object(id) => keep(id),
            _ => true,
        });
    }

    /// The cooked marker, if any.
    pub fn cooked(&self) -> Option<Cooked> {
        self.0.iter().find_map(|a| match a {
            Attribute::Cooked(c) => Some(*c),
            _ => None,
        })
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut set = Self::new();
        for attribute in iter {
            set.insert(attribute);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_set_single_format() {
        let mut set = AttributeSet::new();
        set.insert(Attribute::Format("F1".to_string()));
        set.insert(Attribute::Format("F2".to_string()));
        assert_eq!(set.format(), Some("F2"));
        assert_eq!(set.iter().count(), 1);
    }

    #[test]
    fn test_attribute_set_dedups_objects_and_styles() {
        let set: AttributeSet = [
            Attribute::Object("O1".to_string()),
            Attribute::Style(InlineStyle::Italic),
            Attribute::Object("O1".to_string()),
            Attribute::Style(InlineStyle::Bold),
            Attribute::Style(InlineStyle::Italic),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.objects().collect::<Vec<_>>(), vec!["O1"]);
        assert_eq!(set.styles(), vec![InlineStyle::Bold, InlineStyle::Italic]);
    }

    #[test]
    fn test_retain_objects() {
        let mut op = Op::text("x").with_object("O1").with_object("O2").with_style(InlineStyle::Bold);
        op.attributes.retain_objects(|id| id == "O2");
        assert!(!op.attributes.has_object("O1"));
        assert!(op.attributes.has_object("O2"));
        assert!(op.attributes.has_style(InlineStyle::Bold));
    }

    #[test]
    fn test_delta_json_shape() {
        let json = r#"{"ops":[
            {"insert":"Hello ","attributes":[{"style":"bold"}]},
            {"insert":{"placeholder":"name"}},
            {"insert":{"image":{"src":"data:image/png;base64,AA==","width":10,"height":5}}},
            {"insert":"\n","attributes":[{"format":"F1"}]}
        ]}"#;
        let delta: Delta = serde_json::from_str(json).unwrap();

        assert_eq!(delta.ops.len(), 4);
        assert!(delta.ops[0].attributes.has_style(InlineStyle::Bold));
        assert_eq!(delta.ops[1].placeholder_name(), Some("name"));
        assert!(matches!(delta.ops[2].insert, Insert::Image { .. }));
        assert_eq!(delta.ops[3].attributes.format(), Some("F1"));
        assert_eq!(delta.plain_text(), "Hello \n");
    }

    #[test]
    fn test_cooked_block() {
        let op = Op::cooked("<p>x</p>", true);
        assert!(op.is_cooked());
        assert!(op.is_block());
        assert!(!Op::cooked("x", false).is_block());
    }

    #[test]
    fn test_blank_and_references() {
        let delta = Delta::new()
            .with(Op::text("  ").with_object("O2"))
            .with(Op::text("\n").with_object("O1"))
            .with(Op::text("x").with_object("O2"));
        assert!(!delta.is_blank());
        assert_eq!(delta.referenced_objects(), vec!["O2", "O1"]);
        assert!(delta.references_object("O1"));
        assert!(Delta::new().with(Op::text(" \n")).is_blank());
    }
}
