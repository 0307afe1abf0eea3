//! Rendering of deltas into the four output formats.
//!
//! A renderer turns an op sequence into a fragment of its target language,
//! registering the formats and object styles it uses in the run's
//! [`ResourceTables`]. Fragments rendered at an inner level are spliced into
//! outer templates as cooked ops. Once the whole body is rendered,
//! [`Renderer::finalize`] wraps it with the format's headers.

mod docx;
mod flow;
mod html;
mod options;
mod result;
mod rtf;
mod tables;
mod text;

pub use docx::{DocxDocument, DocxPart, DocxRenderer};
pub use html::{escape_html, HtmlRenderer};
pub use options::{Labels, RenderOptions};
pub use result::{ExportStats, Preview};
pub use rtf::{escape_rtf, RtfRenderer};
pub use tables::{ResourceTables, StyleEntry, StyleKey};
pub use text::{to_text, TextRenderer};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{ExportFormat, Op, ProjectSource};

/// Everything a renderer reads besides the ops themselves.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub source: &'a dyn ProjectSource,
    pub options: &'a RenderOptions,
    /// Honor paragraph format attributes
    pub use_text_formats: bool,
    /// Honor object attributes (spans, classes, control words)
    pub use_object_formats: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a context that honors formats and object styles.
    pub fn new(source: &'a dyn ProjectSource, options: &'a RenderOptions) -> Self {
        Self {
            source,
            options,
            use_text_formats: true,
            use_object_formats: true,
        }
    }

    /// Enable or disable paragraph formats.
    pub fn with_text_formats(mut self, enabled: bool) -> Self {
        self.use_text_formats = enabled;
        self
    }

    /// Enable or disable object styles.
    pub fn with_object_formats(mut self, enabled: bool) -> Self {
        self.use_object_formats = enabled;
        self
    }
}

/// Document-level metadata written by `finalize`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: Option<String>,
    pub created: DateTime<Utc>,
}

/// Finalized output of one run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportBody {
    /// Complete text, HTML or RTF document
    Text(String),
    /// Word-processor document, not yet packaged
    Docx(DocxDocument),
}

impl ExportBody {
    /// The text content, if this is a text body.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExportBody::Text(text) => Some(text),
            ExportBody::Docx(_) => None,
        }
    }
}

/// A format-specific renderer.
pub trait Renderer {
    /// Target format.
    fn format(&self) -> ExportFormat;

    /// Render ops to a fragment, registering used resources in `tables`.
    fn render(&self, ops: &[Op], tables: &mut ResourceTables) -> Result<String>;

    /// Wrap a complete body with the format's headers.
    ///
    /// `tables` must be in their final state.
    fn finalize(&self, body: String, tables: &ResourceTables, info: &DocumentInfo) -> Result<ExportBody>;
}

/// Create the renderer for a format.
pub fn renderer_for<'a>(format: ExportFormat, ctx: RenderContext<'a>) -> Box<dyn Renderer + 'a> {
    match format {
        ExportFormat::Txt => Box::new(TextRenderer::new(ctx)),
        ExportFormat::Html => Box::new(HtmlRenderer::new(ctx)),
        ExportFormat::Rtf => Box::new(RtfRenderer::new(ctx)),
        ExportFormat::Docx => Box::new(DocxRenderer),
    }
}

/// Create the resource tables for a run in the given format.
pub fn tables_for(format: ExportFormat, options: &RenderOptions) -> ResourceTables {
    match format {
        ExportFormat::Rtf => ResourceTables::with_default_font(&options.default_font),
        _ => ResourceTables::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Project;

    #[test]
    fn test_renderer_for_every_format() {
        let project = Project::new("p");
        let options = RenderOptions::default();
        for format in ExportFormat::ALL {
            let renderer = renderer_for(format, RenderContext::new(&project, &options));
            assert_eq!(renderer.format(), format);
        }
    }

    #[test]
    fn test_rtf_tables_start_with_default_font() {
        let options = RenderOptions::default();
        let tables = tables_for(ExportFormat::Rtf, &options);
        assert_eq!(tables.font_index("Times New Roman"), Some(0));
        assert!(tables_for(ExportFormat::Html, &options).fonts().is_empty());
    }
}
