//! Append-only font, color and style tables for one export run.

use serde::Serialize;

use super::rtf::{character_words, escape_rtf, paragraph_words};
use crate::model::{CharacterStyle, Color, FormatId, Object, ObjectId, ParagraphFormat};

/// Key of a style table entry. Formats and objects share one index space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum StyleKey {
    Format(FormatId),
    Object(ObjectId),
}

/// A registered style with the definition captured at registration time.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleEntry {
    pub key: StyleKey,
    pub name: String,
    pub character: CharacterStyle,
    /// Paragraph settings, for format entries
    pub paragraph: Option<ParagraphFormat>,
}

/// Font, color and style tables.
///
/// Entries are appended once, in first-seen order; an index never changes
/// after assignment. The color table starts with black.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTables {
    colors: Vec<Color>,
    fonts: Vec<String>,
    styles: Vec<StyleEntry>,
}

impl Default for ResourceTables {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTables {
    /// Create tables seeded with black.
    pub fn new() -> Self {
        Self {
            colors: vec![Color::BLACK],
            fonts: Vec::new(),
            styles: Vec::new(),
        }
    }

    /// Create tables whose font 0 is the given default font.
    pub fn with_default_font(font: &str) -> Self {
        let mut tables = Self::new();
        tables.add_font(font);
        tables
    }

    /// Add a font, returning its index.
    pub fn add_font(&mut self, name: &str) -> usize {
        match self.font_index(name) {
            Some(index) => index,
            None => {
                self.fonts.push(name.to_string());
                self.fonts.len() - 1
            }
        }
    }

    /// Add a color, returning its index.
    pub fn add_color(&mut self, color: Color) -> usize {
        match self.color_index(color) {
            Some(index) => index,
            None => {
                self.colors.push(color);
                self.colors.len() - 1
            }
        }
    }

    fn add_character(&mut self, style: &CharacterStyle) {
        if let Some(font) = &style.font {
            self.add_font(font);
        }
        for color in style.colors() {
            self.add_color(color);
        }
    }

    /// Register a paragraph format, returning its style index.
    pub fn register_format(&mut self, format: &ParagraphFormat) -> usize {
        let key = StyleKey::Format(format.id.clone());
        if let Some(index) = self.style_index(&key) {
            return index;
        }
        self.add_character(&format.character);
        self.styles.push(StyleEntry {
            key,
            name: format.name.clone(),
            character: format.character.clone(),
            paragraph: Some(format.clone()),
        });
        log::trace!("Registered format {} as style {}", format.id, self.styles.len() - 1);
        self.styles.len() - 1
    }

    /// Register an object's span style, returning its style index.
    pub fn register_object(&mut self, object: &Object) -> usize {
        let key = StyleKey::Object(object.id.clone());
        if let Some(index) = self.style_index(&key) {
            return index;
        }
        self.add_character(&object.style);
        self.styles.push(StyleEntry {
            key,
            name: object.name.clone(),
            character: object.style.clone(),
            paragraph: None,
        });
        self.styles.len() - 1
    }

    /// Index of a font.
    pub fn font_index(&self, name: &str) -> Option<usize> {
        self.fonts.iter().position(|f| f == name)
    }

    /// Index of a color.
    pub fn color_index(&self, color: Color) -> Option<usize> {
        self.colors.iter().position(|c| *c == color)
    }

    /// Index of a style.
    pub fn style_index(&self, key: &StyleKey) -> Option<usize> {
        self.styles.iter().position(|s| &s.key == key)
    }

    /// Fonts in table order.
    pub fn fonts(&self) -> &[String] {
        &self.fonts
    }

    /// Colors in table order.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Styles in table order.
    pub fn styles(&self) -> &[StyleEntry] {
        &self.styles
    }

    /// Registered format ids in table order.
    pub fn formats(&self) -> Vec<FormatId> {
        self.styles
            .iter()
            .filter_map(|s| match &s.key {
                StyleKey::Format(id) => Some(id.clone()),
                StyleKey::Object(_) => None,
            })
            .collect()
    }

    /// Registered object ids in table order.
    pub fn objects(&self) -> Vec<ObjectId> {
        self.styles
            .iter()
            .filter_map(|s| match &s.key {
                StyleKey::Object(id) => Some(id.clone()),
                StyleKey::Format(_) => None,
            })
            .collect()
    }

    /// Render the RTF font table, color table and stylesheet.
    ///
    /// Only valid once the body has been rendered, since rendering is what
    /// fills the tables.
    pub fn finalize(&self) -> String {
        let mut out = String::new();

        out.push_str("{\\fonttbl");
        for (index, font) in self.fonts.iter().enumerate() {
            out.push_str(&format!("{{\\f{}\\fnil {};}}", index, escape_rtf(font)));
        }
        out.push_str("}\n");

        out.push_str("{\\colortbl");
        for color in &self.colors {
            out.push_str(&format!(
                "\\red{}\\green{}\\blue{};",
                color.r, color.g, color.b
            ));
        }
        out.push_str("}\n");

        out.push_str("{\\stylesheet");
        for (index, style) in self.styles.iter().enumerate() {
            match &style.paragraph {
                Some(format) => out.push_str(&format!(
                    "{{\\s{}{} {};}}",
                    index,
                    paragraph_words(format, self),
                    escape_rtf(&style.name)
                )),
                None => out.push_str(&format!(
                    "{{\\*\\cs{}\\additive{} {};}}",
                    index,
                    character_words(&style.character, self),
                    escape_rtf(&style.name)
                )),
            }
        }
        out.push_str("}\n");

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CharacterStyle;

    fn format(id: &str, font: &str, color: Color) -> ParagraphFormat {
        ParagraphFormat::new(id, id).with_character(CharacterStyle {
            font: Some(font.to_string()),
            color: Some(color),
            ..Default::default()
        })
    }

    #[test]
    fn test_register_format_is_idempotent() {
        let mut tables = ResourceTables::new();
        let f1 = format("F1", "Arial", Color::rgb(255, 0, 0));
        let f2 = format("F2", "Georgia", Color::rgb(0, 0, 255));

        assert_eq!(tables.register_format(&f1), 0);
        assert_eq!(tables.register_format(&f2), 1);
        assert_eq!(tables.register_format(&f1), 0);

        assert_eq!(tables.formats(), vec!["F1".to_string(), "F2".to_string()]);
        assert_eq!(tables.fonts(), ["Arial".to_string(), "Georgia".to_string()]);
        assert_eq!(
            tables.colors(),
            [Color::BLACK, Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)]
        );
    }

    #[test]
    fn test_formats_and_objects_share_index_space() {
        let mut tables = ResourceTables::new();
        tables.register_format(&ParagraphFormat::new("F1", "Body"));
        let object = Object::new("O1", "Anna");
        assert_eq!(tables.register_object(&object), 1);
        assert_eq!(tables.objects(), vec!["O1".to_string()]);
        assert_eq!(tables.style_index(&StyleKey::Object("O1".to_string())), Some(1));
    }

    #[test]
    fn test_black_is_not_duplicated() {
        let mut tables = ResourceTables::new();
        tables.register_format(&format("F1", "Arial", Color::BLACK));
        assert_eq!(tables.colors().len(), 1);
    }

    #[test]
    fn test_finalize_headers() {
        let mut tables = ResourceTables::with_default_font("Times New Roman");
        tables.register_format(&format("F1", "Arial", Color::rgb(255, 0, 0)));
        let header = tables.finalize();

        assert!(header.contains("{\\fonttbl{\\f0\\fnil Times New Roman;}{\\f1\\fnil Arial;}}"));
        assert!(header.contains("{\\colortbl\\red0\\green0\\blue0;\\red255\\green0\\blue0;}"));
        assert!(header.contains("{\\stylesheet{\\s0\\ql\\f1\\cf1 F1;}}"));
    }
}
