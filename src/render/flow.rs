//! Paragraph flow shared by the HTML and RTF renderers.
//!
//! Text is buffered line by line. A paragraph format on an op flushes the
//! buffer: every buffered line but the last becomes a default paragraph, the
//! last one takes the format. Cooked block content flushes pending lines and
//! is spliced in between paragraphs.

use super::tables::ResourceTables;
use crate::error::{Error, Result};
use crate::model::{AttributeSet, EmbeddedImage, ImageAlign, Insert, Op};

/// Target-specific pieces of paragraph rendering.
pub(crate) trait ParagraphWriter {
    /// Whether paragraph formats are honored.
    fn uses_formats(&self) -> bool;

    /// Render one newline-free text segment with its inline attributes.
    fn inline(&self, text: &str, attributes: &AttributeSet, tables: &mut ResourceTables) -> String;

    /// Emit one paragraph; `format` is `None` for the default format.
    fn paragraph(
        &self,
        out: &mut String,
        content: &str,
        format: Option<&str>,
        tables: &mut ResourceTables,
    );

    /// Render an image, or `None` to omit it.
    fn image(&self, image: &EmbeddedImage) -> Option<String>;

    /// Emit an aligned image as its own paragraph.
    fn image_paragraph(&self, out: &mut String, markup: &str, align: ImageAlign);
}

/// Rendered output plus the lines of the paragraph in progress.
struct Flow {
    out: String,
    lines: Vec<String>,
}

impl Flow {
    fn new() -> Self {
        Self {
            out: String::new(),
            lines: vec![String::new()],
        }
    }

    fn push(&mut self, s: &str) {
        if let Some(line) = self.lines.last_mut() {
            line.push_str(s);
        }
    }

    fn break_line(&mut self) {
        self.lines.push(String::new());
    }

    fn take_lines(&mut self) -> Vec<String> {
        std::mem::replace(&mut self.lines, vec![String::new()])
    }

    /// Flush with `format` applied to the last buffered line.
    fn flush_with<W: ParagraphWriter + ?Sized>(
        &mut self,
        writer: &W,
        format: &str,
        tables: &mut ResourceTables,
    ) {
        let lines = self.take_lines();
        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            let format = if i == last { Some(format) } else { None };
            writer.paragraph(&mut self.out, line, format, tables);
        }
    }

    /// Flush buffered lines with the default format.
    ///
    /// A trailing empty line only marks the end of the previous paragraph.
    fn flush_pending<W: ParagraphWriter + ?Sized>(&mut self, writer: &W, tables: &mut ResourceTables) {
        let mut lines = self.take_lines();
        if lines.len() == 1 && lines[0].is_empty() {
            return;
        }
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        for line in &lines {
            writer.paragraph(&mut self.out, line, None, tables);
        }
    }
}

/// Render ops as a sequence of paragraphs.
pub(crate) fn render_paragraphs<W: ParagraphWriter + ?Sized>(
    writer: &W,
    ops: &[Op],
    tables: &mut ResourceTables,
) -> Result<String> {
    let mut flow = Flow::new();

    for op in ops {
        if let Some(cooked) = op.attributes.cooked() {
            let content = op
                .as_text()
                .ok_or_else(|| Error::Render("cooked op without text content".to_string()))?;
            if cooked.block {
                flow.flush_pending(writer, tables);
                flow.out.push_str(content);
            } else {
                flow.push(content);
            }
            continue;
        }

        match &op.insert {
            Insert::Text(text) => {
                let format = op.attributes.format().filter(|_| writer.uses_formats());
                let segments: Vec<&str> = text.split('\n').collect();
                let last = segments.len() - 1;
                for (i, segment) in segments.iter().enumerate() {
                    if !segment.is_empty() {
                        let rendered = writer.inline(segment, &op.attributes, tables);
                        flow.push(&rendered);
                    }
                    if i < last {
                        match format {
                            Some(id) => flow.flush_with(writer, id, tables),
                            None => flow.break_line(),
                        }
                    }
                }
                if last == 0 {
                    if let Some(id) = format {
                        flow.flush_with(writer, id, tables);
                    }
                }
            }
            Insert::Image { image } => {
                let Some(markup) = writer.image(image) else {
                    continue;
                };
                match image.align {
                    ImageAlign::Inline => flow.push(&markup),
                    align => {
                        flow.flush_pending(writer, tables);
                        writer.image_paragraph(&mut flow.out, &markup, align);
                    }
                }
            }
            Insert::Placeholder { placeholder } => {
                log::debug!("Skipping unresolved placeholder '{}'", placeholder);
            }
        }
    }

    flow.flush_pending(writer, tables);
    Ok(flow.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Delta, ImageAlign};
    use pretty_assertions::assert_eq;

    /// Writes `[format|content]` per paragraph.
    struct Brackets;

    impl ParagraphWriter for Brackets {
        fn uses_formats(&self) -> bool {
            true
        }

        fn inline(&self, text: &str, _: &AttributeSet, _: &mut ResourceTables) -> String {
            text.to_string()
        }

        fn paragraph(&self, out: &mut String, content: &str, format: Option<&str>, _: &mut ResourceTables) {
            out.push_str(&format!("[{}|{}]", format.unwrap_or("-"), content));
        }

        fn image(&self, image: &EmbeddedImage) -> Option<String> {
            Some(format!("<{}>", image.width))
        }

        fn image_paragraph(&self, out: &mut String, markup: &str, _: ImageAlign) {
            out.push_str(&format!("({})", markup));
        }
    }

    fn render(ops: Vec<Op>) -> String {
        render_paragraphs(&Brackets, &Delta::from_ops(ops).ops, &mut ResourceTables::new()).unwrap()
    }

    #[test]
    fn test_format_applies_to_last_line_only() {
        let out = render(vec![Op::text("a\nb"), Op::text("\n").with_format("F")]);
        assert_eq!(out, "[-|a][F|b]");
    }

    #[test]
    fn test_trailing_newline_ends_paragraph() {
        assert_eq!(render(vec![Op::text("a\nb\n")]), "[-|a][-|b]");
        assert_eq!(render(vec![Op::text("a\n\n")]), "[-|a][-|]");
        assert_eq!(render(vec![]), "");
    }

    #[test]
    fn test_format_resets_after_flush() {
        let out = render(vec![
            Op::text("Title"),
            Op::text("\n").with_format("H"),
            Op::text("body\n"),
        ]);
        assert_eq!(out, "[H|Title][-|body]");
    }

    #[test]
    fn test_cooked_block_splices_between_paragraphs() {
        let out = render(vec![
            Op::text("before"),
            Op::cooked("<BLOCK>", true),
            Op::cooked("<inline>", false),
            Op::text(" after\n"),
        ]);
        assert_eq!(out, "[-|before]<BLOCK>[-|<inline> after]");
    }

    #[test]
    fn test_aligned_image_gets_own_paragraph() {
        let image = EmbeddedImage::new("x", 7, 7).with_align(ImageAlign::Center);
        let out = render(vec![Op::text("a"), Op::image(image), Op::text("b\n")]);
        assert_eq!(out, "[-|a](<7>)[-|b]");
    }

    #[test]
    fn test_unresolved_placeholder_is_skipped() {
        let out = render(vec![Op::text("a"), Op::placeholder("nope"), Op::text("\n")]);
        assert_eq!(out, "[-|a]");
    }
}
