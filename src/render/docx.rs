//! DOCX rendering.
//!
//! Output is plain paragraphs only: inline styles, formats, object styles
//! and images are not carried into the document.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::tables::ResourceTables;
use super::{DocumentInfo, ExportBody, Renderer};
use crate::error::{Error, Result};
use crate::model::{ExportFormat, Insert, Op};

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_WORDML: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_CORE: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";

const REL_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

/// DOCX renderer. Fragments are plain text; paragraphs are split at
/// finalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

impl Renderer for DocxRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn render(&self, ops: &[Op], _tables: &mut ResourceTables) -> Result<String> {
        let mut out = String::new();
        for op in ops {
            match &op.insert {
                Insert::Text(text) => out.push_str(text),
                Insert::Image { .. } => {}
                Insert::Placeholder { placeholder } => {
                    log::debug!("Skipping unresolved placeholder '{}'", placeholder);
                }
            }
        }
        Ok(out)
    }

    fn finalize(&self, body: String, _tables: &ResourceTables, info: &DocumentInfo) -> Result<ExportBody> {
        Ok(ExportBody::Docx(DocxDocument::from_text(&body, info)))
    }
}

/// One file inside the DOCX container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxPart {
    pub name: String,
    pub data: Vec<u8>,
}

/// A word-processor document made of plain paragraphs.
#[derive(Debug, Clone, PartialEq)]
pub struct DocxDocument {
    pub title: String,
    pub author: Option<String>,
    pub created: DateTime<Utc>,
    pub paragraphs: Vec<String>,
}

impl DocxDocument {
    /// Split text into paragraphs on `\n`. A trailing newline ends the last
    /// paragraph rather than opening an empty one.
    pub fn from_text(text: &str, info: &DocumentInfo) -> Self {
        let text = text.strip_suffix('\n').unwrap_or(text);
        let paragraphs = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        Self {
            title: info.title.clone(),
            author: info.author.clone(),
            created: info.created,
            paragraphs,
        }
    }

    /// Paragraphs joined with newlines.
    pub fn plain_text(&self) -> String {
        let mut out = self.paragraphs.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// The OOXML parts, in container order.
    pub fn parts(&self) -> Result<Vec<DocxPart>> {
        Ok(vec![
            DocxPart {
                name: "[Content_Types].xml".to_string(),
                data: self.content_types_xml()?,
            },
            DocxPart {
                name: "_rels/.rels".to_string(),
                data: self.rels_xml()?,
            },
            DocxPart {
                name: "word/document.xml".to_string(),
                data: self.document_xml()?,
            },
            DocxPart {
                name: "docProps/core.xml".to_string(),
                data: self.core_xml()?,
            },
        ])
    }

    fn content_types_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new()?;
        xml.start(BytesStart::new("Types").with_attributes([("xmlns", NS_CONTENT_TYPES)]))?;
        xml.empty(BytesStart::new("Default").with_attributes([
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ]))?;
        xml.empty(
            BytesStart::new("Default")
                .with_attributes([("Extension", "xml"), ("ContentType", "application/xml")]),
        )?;
        xml.empty(BytesStart::new("Override").with_attributes([
            ("PartName", "/word/document.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
            ),
        ]))?;
        xml.empty(BytesStart::new("Override").with_attributes([
            ("PartName", "/docProps/core.xml"),
            ("ContentType", "application/vnd.openxmlformats-package.core-properties+xml"),
        ]))?;
        xml.end("Types")?;
        Ok(xml.finish())
    }

    fn rels_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new()?;
        xml.start(BytesStart::new("Relationships").with_attributes([("xmlns", NS_RELATIONSHIPS)]))?;
        xml.empty(BytesStart::new("Relationship").with_attributes([
            ("Id", "rId1"),
            ("Type", REL_DOCUMENT),
            ("Target", "word/document.xml"),
        ]))?;
        xml.empty(BytesStart::new("Relationship").with_attributes([
            ("Id", "rId2"),
            ("Type", REL_CORE),
            ("Target", "docProps/core.xml"),
        ]))?;
        xml.end("Relationships")?;
        Ok(xml.finish())
    }

    fn document_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new()?;
        xml.start(BytesStart::new("w:document").with_attributes([("xmlns:w", NS_WORDML)]))?;
        xml.start(BytesStart::new("w:body"))?;
        for paragraph in &self.paragraphs {
            if paragraph.is_empty() {
                xml.empty(BytesStart::new("w:p"))?;
                continue;
            }
            xml.start(BytesStart::new("w:p"))?;
            xml.start(BytesStart::new("w:r"))?;
            xml.start(BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]))?;
            xml.text(paragraph)?;
            xml.end("w:t")?;
            xml.end("w:r")?;
            xml.end("w:p")?;
        }
        xml.end("w:body")?;
        xml.end("w:document")?;
        Ok(xml.finish())
    }

    fn core_xml(&self) -> Result<Vec<u8>> {
        let mut xml = XmlWriter::new()?;
        xml.start(BytesStart::new("cp:coreProperties").with_attributes([
            ("xmlns:cp", NS_CORE),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ]))?;
        xml.element("dc:title", &self.title)?;
        if let Some(author) = &self.author {
            xml.element("dc:creator", author)?;
        }
        xml.start(
            BytesStart::new("dcterms:created").with_attributes([("xsi:type", "dcterms:W3CDTF")]),
        )?;
        xml.text(&self.created.format("%Y-%m-%dT%H:%M:%SZ").to_string())?;
        xml.end("dcterms:created")?;
        xml.end("cp:coreProperties")?;
        Ok(xml.finish())
    }
}

/// Thin wrapper mapping quick-xml write failures to package errors.
struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    fn new() -> Result<Self> {
        let mut xml = Self {
            writer: Writer::new(Vec::new()),
        };
        xml.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(xml)
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::Package(format!("failed to write XML: {}", e)))
    }

    fn start(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.write(Event::Start(element))
    }

    fn empty(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.write(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.write(Event::Text(BytesText::new(text)))
    }

    fn element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(BytesStart::new(name))?;
        self.text(text)?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn info() -> DocumentInfo {
        DocumentInfo {
            title: "Novel".to_string(),
            author: Some("A & B".to_string()),
            created: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
        }
    }

    #[test]
    fn test_paragraph_split() {
        let doc = DocxDocument::from_text("a\n\nb\n", &info());
        assert_eq!(doc.paragraphs, vec!["a", "", "b"]);
        assert_eq!(doc.plain_text(), "a\n\nb\n");
        assert!(DocxDocument::from_text("", &info()).paragraphs.is_empty());
    }

    #[test]
    fn test_document_xml_escapes_text() {
        let doc = DocxDocument::from_text("x < y\n\n", &info());
        let xml = String::from_utf8(doc.document_xml().unwrap()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains("<w:p><w:r><w:t xml:space=\"preserve\">x &lt; y</w:t></w:r></w:p><w:p/>"));
    }

    #[test]
    fn test_parts_order_and_core_properties() {
        let doc = DocxDocument::from_text("a", &info());
        let parts = doc.parts().unwrap();
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["[Content_Types].xml", "_rels/.rels", "word/document.xml", "docProps/core.xml"]
        );
        let core = String::from_utf8(parts[3].data.clone()).unwrap();
        assert!(core.contains("<dc:creator>A &amp; B</dc:creator>"));
        assert!(core.contains("2024-05-06T07:08:09Z"));
    }
}
