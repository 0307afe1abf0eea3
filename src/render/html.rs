//! HTML rendering.

use std::fmt::Write;

use regex::Regex;

use super::flow::{render_paragraphs, ParagraphWriter};
use super::tables::{ResourceTables, StyleEntry, StyleKey};
use super::{DocumentInfo, ExportBody, RenderContext, Renderer};
use crate::error::Result;
use crate::model::{
    resolve_format, Alignment, AttributeSet, CharacterStyle, EmbeddedImage, ExportFormat,
    ImageAlign, InlineStyle, Op, ParagraphFormat,
};

const BASE_CSS: &str = "p{margin:0}\
img.shadow{box-shadow:2px 2px 6px rgba(0,0,0,0.4)}\
.property-header{letter-spacing:0.2em;font-weight:bold}\
table.citations{border-collapse:collapse;margin:0.5em 0}\
table.citations th,table.citations td{border:1px solid #999;padding:0.2em 0.5em;text-align:left;vertical-align:top}";

/// HTML renderer.
pub struct HtmlRenderer<'a> {
    ctx: RenderContext<'a>,
    class_regex: Regex,
}

impl<'a> HtmlRenderer<'a> {
    /// Create a new HTML renderer.
    pub fn new(ctx: RenderContext<'a>) -> Self {
        Self {
            ctx,
            class_regex: Regex::new(r"[^A-Za-z0-9-]").unwrap(),
        }
    }

    /// CSS class suffix for an id.
    ///
    /// Every character outside `[A-Za-z0-9-]`, including `_`, becomes
    /// `_<hex>_`, so distinct ids never share a class.
    fn class_id(&self, id: &str) -> String {
        self.class_regex
            .replace_all(id, |caps: &regex::Captures| {
                caps[0]
                    .chars()
                    .map(|c| format!("_{:x}_", u32::from(c)))
                    .collect::<String>()
            })
            .into_owned()
    }

    /// Per-run stylesheet from the registered formats and objects.
    fn stylesheet(&self, tables: &ResourceTables) -> String {
        let mut css = String::from(BASE_CSS);
        let _ = write!(
            css,
            "body{{font-family:{};font-size:{}pt}}",
            css_font(&self.ctx.options.default_font),
            self.ctx.options.default_font_size
        );
        for entry in tables.styles() {
            self.style_rule(&mut css, entry);
        }
        css
    }

    fn style_rule(&self, css: &mut String, entry: &StyleEntry) {
        match &entry.key {
            StyleKey::Format(id) => {
                let mut decls = entry
                    .paragraph
                    .as_ref()
                    .map(paragraph_declarations)
                    .unwrap_or_default();
                decls.push_str(&character_declarations(&entry.character));
                let _ = write!(css, "p.format-{}{{{}}}", self.class_id(id), decls);
            }
            StyleKey::Object(id) => {
                let decls = character_declarations(&entry.character);
                if !decls.is_empty() {
                    let _ = write!(css, ".object-{}-true{{{}}}", self.class_id(id), decls);
                }
            }
        }
    }
}

impl Renderer for HtmlRenderer<'_> {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn render(&self, ops: &[Op], tables: &mut ResourceTables) -> Result<String> {
        render_paragraphs(self, ops, tables)
    }

    fn finalize(&self, body: String, tables: &ResourceTables, info: &DocumentInfo) -> Result<ExportBody> {
        let mut out = String::with_capacity(body.len() + 2048);
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(out, "<title>{}</title>", escape_html(&info.title));
        if let Some(author) = &info.author {
            let _ = writeln!(out, "<meta name=\"author\" content=\"{}\">", escape_html(author));
        }
        let _ = writeln!(out, "<style>{}</style>", self.stylesheet(tables));
        out.push_str("</head>\n<body>\n");
        out.push_str(&body);
        out.push_str("</body>\n</html>\n");
        Ok(ExportBody::Text(out))
    }
}

impl ParagraphWriter for HtmlRenderer<'_> {
    fn uses_formats(&self) -> bool {
        self.ctx.use_text_formats
    }

    fn inline(&self, text: &str, attributes: &AttributeSet, tables: &mut ResourceTables) -> String {
        let mut out = escape_html(text);
        for style in attributes.styles() {
            let tag = match style {
                InlineStyle::Bold => "strong",
                InlineStyle::Italic => "em",
                InlineStyle::Underline => "u",
                InlineStyle::Strike => "s",
            };
            out = format!("<{tag}>{out}</{tag}>");
        }
        if self.ctx.use_object_formats {
            for id in attributes.objects() {
                match self.ctx.source.object(id) {
                    Some(object) => {
                        tables.register_object(object);
                        out = format!(
                            "<span class=\"object-{}-true\">{}</span>",
                            self.class_id(id),
                            out
                        );
                    }
                    None => log::warn!("Span references unknown object {}", id),
                }
            }
        }
        out
    }

    fn paragraph(
        &self,
        out: &mut String,
        content: &str,
        format: Option<&str>,
        tables: &mut ResourceTables,
    ) {
        let content = if content.is_empty() { "<br>" } else { content };
        match format {
            Some(id) => {
                let format = resolve_format(self.ctx.source, id);
                tables.register_format(&format);
                let _ = writeln!(
                    out,
                    "<p class=\"format-{}\">{}</p>",
                    self.class_id(&format.id),
                    content
                );
            }
            None => {
                let _ = writeln!(out, "<p>{}</p>", content);
            }
        }
    }

    fn image(&self, image: &EmbeddedImage) -> Option<String> {
        let mut tag = format!(
            "<img src=\"{}\" width=\"{}\" height=\"{}\" style=\"width:{}px;height:{}px\"",
            escape_html(&image.src),
            image.width,
            image.height,
            image.width,
            image.height
        );
        if let Some(title) = &image.title {
            let _ = write!(tag, " title=\"{}\" alt=\"{}\"", escape_html(title), escape_html(title));
        }
        if image.shadow {
            tag.push_str(" class=\"shadow\"");
        }
        tag.push('>');
        Some(tag)
    }

    fn image_paragraph(&self, out: &mut String, markup: &str, align: ImageAlign) {
        let align = match align {
            ImageAlign::Center => "center",
            ImageAlign::Right => "right",
            ImageAlign::Left | ImageAlign::Inline => "left",
        };
        let _ = writeln!(out, "<p style=\"text-align:{}\">{}</p>", align, markup);
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` for HTML text and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn css_font(name: &str) -> String {
    format!("'{}'", name.replace(['\'', '<', '>'], ""))
}

fn character_declarations(style: &CharacterStyle) -> String {
    let mut decls = String::new();
    if let Some(font) = &style.font {
        let _ = write!(decls, "font-family:{};", css_font(font));
    }
    if let Some(size) = style.size {
        let _ = write!(decls, "font-size:{}pt;", size);
    }
    if style.bold {
        decls.push_str("font-weight:bold;");
    }
    if style.italic {
        decls.push_str("font-style:italic;");
    }
    match (style.underline, style.strike) {
        (true, true) => decls.push_str("text-decoration:underline line-through;"),
        (true, false) => decls.push_str("text-decoration:underline;"),
        (false, true) => decls.push_str("text-decoration:line-through;"),
        (false, false) => {}
    }
    if let Some(color) = style.color {
        let _ = write!(decls, "color:{};", color.to_hex());
    }
    if let Some(color) = style.background {
        let _ = write!(decls, "background-color:{};", color.to_hex());
    }
    decls
}

fn paragraph_declarations(format: &ParagraphFormat) -> String {
    let mut decls = String::new();
    let align = match format.align {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "justify",
    };
    let _ = write!(decls, "text-align:{};", align);
    if format.first_line_indent != 0.0 {
        let _ = write!(decls, "text-indent:{}mm;", format.first_line_indent);
    }
    if format.indent_left != 0.0 {
        let _ = write!(decls, "margin-left:{}mm;", format.indent_left);
    }
    if format.indent_right != 0.0 {
        let _ = write!(decls, "margin-right:{}mm;", format.indent_right);
    }
    if format.space_before != 0.0 {
        let _ = write!(decls, "margin-top:{}pt;", format.space_before);
    }
    if format.space_after != 0.0 {
        let _ = write!(decls, "margin-bottom:{}pt;", format.space_after);
    }
    if format.line_spacing != 100 {
        let _ = write!(decls, "line-height:{}%;", format.line_spacing);
    }
    decls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, Object, Project};
    use crate::render::RenderOptions;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        let mut project = Project::new("Novel");
        project.add_format(
            ParagraphFormat::new("F 1", "Heading").with_character(CharacterStyle {
                bold: true,
                ..Default::default()
            }),
        );
        project.add_object(Object::new("O1", "Anna").with_style(CharacterStyle {
            color: Some(Color::rgb(255, 0, 0)),
            ..Default::default()
        }));
        project
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>&"), "&lt;b&gt;&amp;");
        assert_eq!(escape_html("\"it's\""), "&quot;it&#39;s&quot;");
    }

    #[test]
    fn test_cooked_is_not_escaped() {
        let project = project();
        let options = RenderOptions::default();
        let renderer = HtmlRenderer::new(RenderContext::new(&project, &options));
        let ops = vec![Op::text("<b>&\n"), Op::cooked("<b>&</b>", true)];
        let out = renderer.render(&ops, &mut ResourceTables::new()).unwrap();
        assert_eq!(out, "<p>&lt;b&gt;&amp;</p>\n<b>&</b>");
    }

    #[test]
    fn test_inline_styles_and_object_span() {
        let project = project();
        let options = RenderOptions::default();
        let renderer = HtmlRenderer::new(RenderContext::new(&project, &options));
        let mut tables = ResourceTables::new();
        let op = Op::text("Anna")
            .with_style(InlineStyle::Bold)
            .with_style(InlineStyle::Italic)
            .with_object("O1");
        let out = renderer.inline("Anna", &op.attributes, &mut tables);
        assert_eq!(
            out,
            "<span class=\"object-O1-true\"><em><strong>Anna</strong></em></span>"
        );
        assert_eq!(tables.objects(), vec!["O1".to_string()]);
    }

    #[test]
    fn test_paragraph_class_is_sanitized() {
        let project = project();
        let options = RenderOptions::default();
        let renderer = HtmlRenderer::new(RenderContext::new(&project, &options));
        let mut tables = ResourceTables::new();
        let ops = vec![Op::text("Title"), Op::text("\n").with_format("F 1")];
        let out = renderer.render(&ops, &mut tables).unwrap();
        assert_eq!(out, "<p class=\"format-F_20_1\">Title</p>\n");

        assert_eq!(renderer.class_id("F_1"), "F_5f_1");
        assert_eq!(renderer.class_id("a1b2-c3"), "a1b2-c3");
        assert_ne!(renderer.class_id("F 1"), renderer.class_id("F_1"));

        let empty = renderer.render(&[Op::text("\n\n")], &mut tables).unwrap();
        assert_eq!(empty, "<p><br></p>\n<p><br></p>\n");
    }

    #[test]
    fn test_finalize_builds_css_from_tables() {
        let project = project();
        let options = RenderOptions::default();
        let renderer = HtmlRenderer::new(RenderContext::new(&project, &options));
        let mut tables = ResourceTables::new();
        let ops = vec![
            Op::text("Anna").with_object("O1"),
            Op::text("\n").with_format("F 1"),
        ];
        let body = renderer.render(&ops, &mut tables).unwrap();
        let info = DocumentInfo {
            title: "Novel".to_string(),
            author: None,
            created: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap(),
        };
        let ExportBody::Text(html) = renderer.finalize(body, &tables, &info).unwrap() else {
            panic!("expected text body");
        };
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Novel</title>"));
        assert!(html.contains(".object-O1-true{color:#ff0000;}"));
        assert!(html.contains("p.format-F_20_1{text-align:left;font-weight:bold;}"));
        assert!(html.contains("<p class=\"format-F_20_1\"><span class=\"object-O1-true\">Anna</span></p>"));
        assert!(html.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn test_aligned_image() {
        let project = project();
        let options = RenderOptions::default();
        let renderer = HtmlRenderer::new(RenderContext::new(&project, &options));
        let image = EmbeddedImage::new("data:image/png;base64,AA==", 10, 20)
            .with_align(ImageAlign::Center)
            .with_title("Map");
        let out = renderer.render(&[Op::image(image)], &mut ResourceTables::new()).unwrap();
        assert_eq!(
            out,
            "<p style=\"text-align:center\"><img src=\"data:image/png;base64,AA==\" width=\"10\" height=\"20\" style=\"width:10px;height:20px\" title=\"Map\" alt=\"Map\"></p>\n"
        );
    }
}
