//! Plain text rendering.

use super::tables::ResourceTables;
use super::{DocumentInfo, ExportBody, RenderContext, RenderOptions, Renderer};
use crate::error::Result;
use crate::model::{Delta, ExportFormat, Insert, Op, Project};

/// Render a delta to plain text with default project data.
pub fn to_text(delta: &Delta, options: &RenderOptions) -> Result<String> {
    let project = Project::new("");
    let renderer = TextRenderer::new(RenderContext::new(&project, options));
    renderer.render(&delta.ops, &mut ResourceTables::new())
}

/// Plain text renderer. Text is emitted verbatim; styles are ignored.
pub struct TextRenderer<'a> {
    ctx: RenderContext<'a>,
}

impl<'a> TextRenderer<'a> {
    /// Create a new plain text renderer.
    pub fn new(ctx: RenderContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Renderer for TextRenderer<'_> {
    fn format(&self) -> ExportFormat {
        ExportFormat::Txt
    }

    fn render(&self, ops: &[Op], _tables: &mut ResourceTables) -> Result<String> {
        let mut out = String::new();
        for op in ops {
            match &op.insert {
                Insert::Text(text) => out.push_str(text),
                Insert::Image { image } => {
                    if self.ctx.options.show_image_placeholders {
                        out.push_str(&self.ctx.options.labels.image_phrase(image.width, image.height));
                    }
                }
                Insert::Placeholder { placeholder } => {
                    log::debug!("Skipping unresolved placeholder '{}'", placeholder);
                }
            }
        }
        Ok(out)
    }

    fn finalize(&self, body: String, _tables: &ResourceTables, _info: &DocumentInfo) -> Result<ExportBody> {
        Ok(ExportBody::Text(body))
    }
}
