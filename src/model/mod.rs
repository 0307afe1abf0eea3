//! Data model consumed by the export pipeline.
//!
//! The delta types describe rich-text content; the project types are the
//! read-only view of the corpus (texts, objects, formats) an export draws
//! from; the profile is the persisted configuration of one export.

mod delta;
mod profile;
mod project;
mod property;
mod style;

pub use delta::{
    Attribute, AttributeSet, Cooked, Delta, EmbeddedImage, FormatId, ImageAlign, InlineStyle,
    Insert, ObjectId, Op, TextId, DEFAULT_FORMAT_ID,
};
pub use profile::{
    CitationSelection, ExportFormat, ObjectSelection, Profile, Templates, TextObjectSelection,
    TextSelection,
};
pub use project::{
    resolve_format, Collection, Object, Project, ProjectInfo, ProjectSource, Text,
};
pub use property::{
    GeoPoint, MapMarker, MapValue, PropertyId, PropertyKind, PropertyValue, SchemeProperty,
};
pub use style::{mm_to_twips, pt_to_twips, Alignment, CharacterStyle, Color, ParagraphFormat};
