//! RTF rendering.
//!
//! The body is rendered first because rendering fills the resource tables;
//! the font table, color table and stylesheet are emitted from the final
//! table state afterwards.

use std::fmt::Write;

use base64::Engine;
use chrono::{Datelike, Timelike};

use super::flow::{render_paragraphs, ParagraphWriter};
use super::tables::ResourceTables;
use super::{DocumentInfo, ExportBody, RenderContext, Renderer};
use crate::error::Result;
use crate::model::{
    mm_to_twips, pt_to_twips, resolve_format, Alignment, AttributeSet, CharacterStyle,
    EmbeddedImage, ExportFormat, ImageAlign, InlineStyle, Op, ParagraphFormat, DEFAULT_FORMAT_ID,
};

/// Twips per pixel, assuming 180 dpi.
const TWIPS_PER_PIXEL: u32 = 1440 / 180;

/// RTF renderer.
pub struct RtfRenderer<'a> {
    ctx: RenderContext<'a>,
}

impl<'a> RtfRenderer<'a> {
    /// Create a new RTF renderer.
    pub fn new(ctx: RenderContext<'a>) -> Self {
        Self { ctx }
    }

    fn format_for(&self, id: Option<&str>) -> ParagraphFormat {
        resolve_format(self.ctx.source, id.unwrap_or(DEFAULT_FORMAT_ID))
    }
}

impl Renderer for RtfRenderer<'_> {
    fn format(&self) -> ExportFormat {
        ExportFormat::Rtf
    }

    fn render(&self, ops: &[Op], tables: &mut ResourceTables) -> Result<String> {
        render_paragraphs(self, ops, tables)
    }

    fn finalize(&self, body: String, tables: &ResourceTables, info: &DocumentInfo) -> Result<ExportBody> {
        let mut out = String::with_capacity(body.len() + 1024);
        out.push_str("{\\rtf1\\ansi\\deff0\n");
        out.push_str(&tables.finalize());
        out.push_str(&info_group(info));
        out.push_str(&body);
        out.push('}');
        Ok(ExportBody::Text(out))
    }
}

impl ParagraphWriter for RtfRenderer<'_> {
    fn uses_formats(&self) -> bool {
        self.ctx.use_text_formats
    }

    fn inline(&self, text: &str, attributes: &AttributeSet, tables: &mut ResourceTables) -> String {
        let mut words = String::new();
        for style in attributes.styles() {
            words.push_str(match style {
                InlineStyle::Bold => "\\b1",
                InlineStyle::Italic => "\\i1",
                InlineStyle::Underline => "\\ul1",
                InlineStyle::Strike => "\\strike1",
            });
        }
        if self.ctx.use_object_formats {
            for id in attributes.objects() {
                match self.ctx.source.object(id) {
                    Some(object) => {
                        let index = tables.register_object(object);
                        let _ = write!(words, "\\cs{}", index);
                        words.push_str(&character_words(&object.style, tables));
                    }
                    None => log::warn!("Span references unknown object {}", id),
                }
            }
        }

        let escaped = escape_rtf(text);
        if words.is_empty() {
            escaped
        } else {
            format!("{{{} {}}}", words, escaped)
        }
    }

    fn paragraph(
        &self,
        out: &mut String,
        content: &str,
        format: Option<&str>,
        tables: &mut ResourceTables,
    ) {
        let format = self.format_for(format);
        let index = tables.register_format(&format);
        let _ = writeln!(
            out,
            "\\pard\\plain\\s{}{} {}\\par",
            index,
            paragraph_words(&format, tables),
            content
        );
    }

    fn image(&self, image: &EmbeddedImage) -> Option<String> {
        let picture = image_data(&image.src)
            .and_then(|(mime, bytes)| picture(&mime, &bytes, image.width, image.height));
        if picture.is_none() {
            log::warn!("Omitting image without embeddable PNG/JPEG data");
        }
        picture
    }

    fn image_paragraph(&self, out: &mut String, markup: &str, align: ImageAlign) {
        let _ = writeln!(out, "\\pard\\plain{} {}\\par", image_align_word(align), markup);
    }
}

fn image_align_word(align: ImageAlign) -> &'static str {
    match align {
        ImageAlign::Center => "\\qc",
        ImageAlign::Right => "\\qr",
        ImageAlign::Left | ImageAlign::Inline => "\\ql",
    }
}

/// Escape text for RTF.
///
/// Backslash and braces are escaped; characters outside ASCII become
/// `\uN?` with N the signed 16-bit value, and characters outside the Basic
/// Multilingual Plane become `?`.
pub fn escape_rtf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let cp = c as u32;
        match c {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            _ if cp < 128 => out.push(c),
            _ if cp < 65536 => {
                let value = if cp < 32768 { cp as i32 } else { cp as i32 - 65536 };
                let _ = write!(out, "\\u{}?", value);
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Control words for character-level styling.
///
/// Fonts and colors must already be registered in `tables`.
pub(crate) fn character_words(style: &CharacterStyle, tables: &ResourceTables) -> String {
    let mut words = String::new();
    if let Some(index) = style.font.as_deref().and_then(|f| tables.font_index(f)) {
        let _ = write!(words, "\\f{}", index);
    }
    if let Some(size) = style.size {
        let _ = write!(words, "\\fs{}", (size * 2.0).round() as i32);
    }
    if style.bold {
        words.push_str("\\b");
    }
    if style.italic {
        words.push_str("\\i");
    }
    if style.underline {
        words.push_str("\\ul");
    }
    if style.strike {
        words.push_str("\\strike");
    }
    if let Some(index) = style.color.and_then(|c| tables.color_index(c)) {
        let _ = write!(words, "\\cf{}", index);
    }
    if let Some(index) = style.background.and_then(|c| tables.color_index(c)) {
        let _ = write!(words, "\\highlight{}", index);
    }
    words
}

/// Control words for a complete paragraph format.
pub(crate) fn paragraph_words(format: &ParagraphFormat, tables: &ResourceTables) -> String {
    let mut words = String::from(match format.align {
        Alignment::Left => "\\ql",
        Alignment::Center => "\\qc",
        Alignment::Right => "\\qr",
        Alignment::Justify => "\\qj",
    });
    let indents = [
        ("fi", format.first_line_indent),
        ("li", format.indent_left),
        ("ri", format.indent_right),
    ];
    for (word, mm) in indents {
        if mm != 0.0 {
            let _ = write!(words, "\\{}{}", word, mm_to_twips(mm));
        }
    }
    if format.space_before != 0.0 {
        let _ = write!(words, "\\sb{}", pt_to_twips(format.space_before));
    }
    if format.space_after != 0.0 {
        let _ = write!(words, "\\sa{}", pt_to_twips(format.space_after));
    }
    if format.line_spacing != 100 {
        let _ = write!(words, "\\sl{}\\slmult1", format.line_spacing * 240 / 100);
    }
    words.push_str(&character_words(&format.character, tables));
    words
}

/// Decode a `data:` URI into its MIME type and bytes.
pub(crate) fn image_data(src: &str) -> Option<(String, Vec<u8>)> {
    let rest = src.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    Some((mime.to_string(), bytes))
}

/// An RTF picture group for PNG or JPEG bytes.
pub(crate) fn picture(mime: &str, bytes: &[u8], width: u32, height: u32) -> Option<String> {
    let blip = match mime {
        "image/png" => "\\pngblip",
        "image/jpeg" | "image/jpg" => "\\jpegblip",
        _ => return None,
    };
    let mut out = String::with_capacity(bytes.len() * 2 + 128);
    let _ = write!(
        out,
        "{{\\*\\shppict{{\\pict{}\\picw{}\\pich{}\\picwgoal{}\\pichgoal{} ",
        blip,
        width,
        height,
        width * TWIPS_PER_PIXEL,
        height * TWIPS_PER_PIXEL
    );
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out.push_str("}}");
    Some(out)
}

fn info_group(info: &DocumentInfo) -> String {
    let mut out = String::from("{\\info");
    let _ = write!(out, "{{\\title {}}}", escape_rtf(&info.title));
    if let Some(author) = &info.author {
        let _ = write!(out, "{{\\author {}}}", escape_rtf(author));
    }
    let created = info.created;
    let _ = write!(
        out,
        "{{\\creatim\\yr{}\\mo{}\\dy{}\\hr{}\\min{}}}",
        created.year(),
        created.month(),
        created.day(),
        created.hour(),
        created.minute()
    );
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, Object, Project};
    use crate::render::RenderOptions;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_literals() {
        assert_eq!(escape_rtf("a\\b{c}"), "a\\\\b\\{c\\}");
    }

    #[test]
    fn test_escape_unicode() {
        assert_eq!(escape_rtf("é"), "\\u233?");
        assert_eq!(escape_rtf("😀"), "?");
        // U+FFFD is above 32767 and wraps to a negative value
        assert_eq!(escape_rtf("\u{fffd}"), "\\u-3?");
        assert_eq!(escape_rtf("plain"), "plain");
    }

    #[test]
    fn test_picture_goals() {
        let pict = picture("image/png", &[0x89, 0x50], 180, 90).unwrap();
        assert_eq!(
            pict,
            "{\\*\\shppict{\\pict\\pngblip\\picw180\\pich90\\picwgoal1440\\pichgoal720 8950}}"
        );
        assert!(picture("image/gif", &[1], 1, 1).is_none());
    }

    #[test]
    fn test_image_data_uri() {
        let (mime, bytes) = image_data("data:image/png;base64,AQID").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(image_data("https://example.com/a.png").is_none());
    }

    #[test]
    fn test_inline_styles_and_object_words() {
        let mut project = Project::new("p");
        project.add_object(Object::new("O1", "Anna").with_style(CharacterStyle {
            color: Some(Color::rgb(0, 128, 0)),
            ..Default::default()
        }));
        let options = RenderOptions::default();
        let renderer = RtfRenderer::new(RenderContext::new(&project, &options));
        let mut tables = ResourceTables::new();

        let op = Op::text("Anna").with_style(InlineStyle::Bold).with_object("O1");
        let out = renderer.inline("Anna", &op.attributes, &mut tables);
        assert_eq!(out, "{\\b1\\cs0\\cf1 Anna}");
        assert_eq!(tables.objects(), vec!["O1".to_string()]);
    }

    #[test]
    fn test_paragraphs_register_formats() {
        let mut project = Project::new("p");
        project.add_format(ParagraphFormat::new("F1", "Heading").with_align(Alignment::Center));
        let options = RenderOptions::default();
        let renderer = RtfRenderer::new(RenderContext::new(&project, &options));
        let mut tables = ResourceTables::new();

        let ops = vec![
            Op::text("Title"),
            Op::text("\n").with_format("F1"),
            Op::text("Body\n"),
        ];
        let out = renderer.render(&ops, &mut tables).unwrap();
        assert_eq!(
            out,
            "\\pard\\plain\\s0\\qc Title\\par\n\\pard\\plain\\s1\\ql Body\\par\n"
        );
        assert_eq!(tables.formats(), vec!["F1".to_string(), DEFAULT_FORMAT_ID.to_string()]);
    }
}
