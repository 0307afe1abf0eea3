//! Export profiles: output format, selection filters and templates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::delta::{Delta, Op};
use crate::error::{Error, Result};

/// Output encoding of an export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Plain UTF-8 text
    #[default]
    Txt,
    /// Self-contained HTML
    Html,
    /// Rich Text Format
    Rtf,
    /// Office Open XML word-processing document
    Docx,
}

impl ExportFormat {
    /// All supported formats.
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Txt,
        ExportFormat::Html,
        ExportFormat::Rtf,
        ExportFormat::Docx,
    ];

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Html => "html",
            ExportFormat::Rtf => "rtf",
            ExportFormat::Docx => "docx",
        }
    }

    /// MIME type of the output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain",
            ExportFormat::Html => "text/html",
            ExportFormat::Rtf => "application/rtf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Guess the format from a file extension.
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Txt),
            "html" | "htm" => Ok(ExportFormat::Html),
            "rtf" => Ok(ExportFormat::Rtf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }

    /// Guess the format from a file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        Self::from_extension(ext)
    }

    /// Whether the renderer embeds rasterized maps.
    pub fn embeds_images(&self) -> bool {
        matches!(self, ExportFormat::Html | ExportFormat::Rtf)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
    }
}

/// Which texts take part in the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextSelection {
    #[default]
    All,
    Checked,
}

/// Which texts are searched for citations of exported objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CitationSelection {
    All,
    Checked,
    /// Exactly the texts selected for export
    #[default]
    CoveredByExportedTexts,
}

/// Which object references survive inside exported text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextObjectSelection {
    #[default]
    All,
    Checked,
}

/// Which objects are exported standalone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectSelection {
    All,
    Checked,
    /// Objects referenced by at least one exported text
    #[default]
    Used,
}

/// Per-level templates, each a delta containing placeholder ops.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Templates {
    /// Wraps the whole document
    pub document: Delta,
    /// Wraps one text
    pub text: Delta,
    /// Inserted where an object-attributed span starts
    pub object_start: Delta,
    /// Inserted where an object-attributed span ends
    pub object_end: Delta,
    /// Wraps one exported object
    pub object: Delta,
    /// Wraps one property of an exported object
    pub properties: Delta,
}

impl Templates {
    /// Sensible templates usable with every format.
    pub fn standard() -> Self {
        Self {
            document: Delta::from_ops(vec![
                Op::placeholder("texts"),
                Op::text("\n"),
                Op::placeholder("objects"),
                Op::text("\n"),
            ]),
            text: Delta::from_ops(vec![
                Op::placeholder("name").with_style(super::delta::InlineStyle::Bold),
                Op::text("\n"),
                Op::placeholder("content"),
                Op::text("\n"),
            ]),
            object_start: Delta::new(),
            object_end: Delta::new(),
            object: Delta::from_ops(vec![
                Op::placeholder("name").with_style(super::delta::InlineStyle::Bold),
                Op::text("\n"),
                Op::placeholder("properties"),
                Op::text("\n"),
                Op::placeholder("citations"),
                Op::text("\n"),
            ]),
            properties: Delta::from_ops(vec![
                Op::placeholder("name"),
                Op::text(": "),
                Op::placeholder("value"),
                Op::text("\n"),
            ]),
        }
    }
}

/// Persisted export configuration. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub format: ExportFormat,
    pub texts: TextSelection,
    pub citation_texts: CitationSelection,
    pub text_objects: TextObjectSelection,
    pub objects: ObjectSelection,
    pub templates: Templates,
    pub ignore_empty_texts: bool,
    pub use_text_formats: bool,
    pub use_object_formats: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Standard".to_string(),
            format: ExportFormat::default(),
            texts: TextSelection::default(),
            citation_texts: CitationSelection::default(),
            text_objects: TextObjectSelection::default(),
            objects: ObjectSelection::default(),
            templates: Templates::standard(),
            ignore_empty_texts: true,
            use_text_formats: true,
            use_object_formats: true,
        }
    }
}

impl Profile {
    /// Default profile for the given format.
    pub fn for_format(format: ExportFormat) -> Self {
        Self {
            name: format!("Standard ({})", format),
            format,
            ..Default::default()
        }
    }

    /// Set the output format.
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the text selection.
    pub fn with_texts(mut self, selection: TextSelection) -> Self {
        self.texts = selection;
        self
    }

    /// Set the citation text selection.
    pub fn with_citation_texts(mut self, selection: CitationSelection) -> Self {
        self.citation_texts = selection;
        self
    }

    /// Set which object references survive in text content.
    pub fn with_text_objects(mut self, selection: TextObjectSelection) -> Self {
        self.text_objects = selection;
        self
    }

    /// Set the standalone object selection.
    pub fn with_objects(mut self, selection: ObjectSelection) -> Self {
        self.objects = selection;
        self
    }

    /// Replace the templates.
    pub fn with_templates(mut self, templates: Templates) -> Self {
        self.templates = templates;
        self
    }

    /// Parse a profile from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a profile from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_extension("RTF").unwrap(), ExportFormat::Rtf);
        assert_eq!(ExportFormat::from_extension(".htm").unwrap(), ExportFormat::Html);
        assert!(matches!(
            ExportFormat::from_extension("pdf"),
            Err(Error::UnknownFormat(_))
        ));
        assert_eq!(
            ExportFormat::from_path("out/book.docx").unwrap(),
            ExportFormat::Docx
        );
        assert!(ExportFormat::from_path("README").is_err());
    }

    #[test]
    fn test_profile_json_round_trip_keeps_templates() {
        let profile = Profile::for_format(ExportFormat::Html);
        let json = profile.to_json().unwrap();
        assert!(json.contains("\"useTextFormats\": true"));
        assert!(json.contains("\"coveredByExportedTexts\""));

        let back = Profile::from_json(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_profile_partial_json_uses_defaults() {
        let profile = Profile::from_json(r#"{"format":"rtf","objects":"checked"}"#).unwrap();
        assert_eq!(profile.format, ExportFormat::Rtf);
        assert_eq!(profile.objects, ObjectSelection::Checked);
        assert_eq!(profile.texts, TextSelection::All);
        assert!(!profile.templates.document.is_empty());
    }
}
