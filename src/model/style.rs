//! Paragraph formats, character styles and colors.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::delta::{FormatId, DEFAULT_FORMAT_ID};

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Black, the first entry of every RTF color table.
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Create a color from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex notation (`#rrggbb`).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(format!("invalid color: {}", s)),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| format!("invalid color: {}", s))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Character-level styling shared by paragraph formats and object styles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterStyle {
    /// Font family name
    pub font: Option<String>,

    /// Font size in points
    pub size: Option<f32>,

    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,

    /// Text color
    pub color: Option<Color>,

    /// Background / highlight color
    pub background: Option<Color>,
}

impl CharacterStyle {
    /// Check if the style changes nothing.
    pub fn is_plain(&self) -> bool {
        *self == CharacterStyle::default()
    }

    /// Colors referenced by this style, text color first.
    pub fn colors(&self) -> impl Iterator<Item = Color> {
        self.color.into_iter().chain(self.background)
    }
}

/// A named paragraph format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphFormat {
    pub id: FormatId,
    pub name: String,

    #[serde(default)]
    pub character: CharacterStyle,

    #[serde(default)]
    pub align: Alignment,

    /// First line indent in millimeters
    #[serde(default)]
    pub first_line_indent: f32,

    /// Left indent in millimeters
    #[serde(default)]
    pub indent_left: f32,

    /// Right indent in millimeters
    #[serde(default)]
    pub indent_right: f32,

    /// Line spacing in percent (100 = single)
    #[serde(default = "default_line_spacing")]
    pub line_spacing: u32,

    /// Space before the paragraph in points
    #[serde(default)]
    pub space_before: f32,

    /// Space after the paragraph in points
    #[serde(default)]
    pub space_after: f32,
}

fn default_line_spacing() -> u32 {
    100
}

impl ParagraphFormat {
    /// Create a format with default settings.
    pub fn new(id: impl Into<FormatId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            character: CharacterStyle::default(),
            align: Alignment::Left,
            first_line_indent: 0.0,
            indent_left: 0.0,
            indent_right: 0.0,
            line_spacing: default_line_spacing(),
            space_before: 0.0,
            space_after: 0.0,
        }
    }

    /// The built-in standard format.
    pub fn standard() -> Self {
        Self::new(DEFAULT_FORMAT_ID, "Standard")
    }

    /// Set the character style.
    pub fn with_character(mut self, character: CharacterStyle) -> Self {
        self.character = character;
        self
    }

    /// Set the alignment.
    pub fn with_align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    /// Check if this is the built-in standard format.
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_FORMAT_ID
    }
}

/// Convert millimeters to twips.
pub fn mm_to_twips(mm: f32) -> i32 {
    (mm * 1440.0 / 25.4).round() as i32
}

/// Convert points to twips.
pub fn pt_to_twips(pt: f32) -> i32 {
    (pt * 20.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
        assert_eq!("#f00".parse::<Color>().unwrap(), Color::rgb(255, 0, 0));
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_serde() {
        let json = serde_json::to_string(&Color::rgb(1, 2, 255)).unwrap();
        assert_eq!(json, "\"#0102ff\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(1, 2, 255));
    }

    #[test]
    fn test_format_defaults_from_json() {
        let format: ParagraphFormat =
            serde_json::from_str(r#"{"id":"F1","name":"Quote","align":"center"}"#).unwrap();
        assert_eq!(format.line_spacing, 100);
        assert_eq!(format.align, Alignment::Center);
        assert!(format.character.is_plain());
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(mm_to_twips(25.4), 1440);
        assert_eq!(pt_to_twips(12.0), 240);
    }
}
