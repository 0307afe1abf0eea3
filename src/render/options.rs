//! Rendering options and user-facing labels.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options shared by all renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Emit the image phrase for embedded images in plain text
    pub show_image_placeholders: bool,

    /// `chrono` format string for dates
    pub date_format: String,

    /// Font used where no format sets one
    pub default_font: String,

    /// Font size in points used where no format sets one
    pub default_font_size: f32,

    /// Localized phrases
    pub labels: Labels,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the plain-text image phrase.
    pub fn with_image_placeholders(mut self, show: bool) -> Self {
        self.show_image_placeholders = show;
        self
    }

    /// Set the date format.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Set the default font.
    pub fn with_default_font(mut self, font: impl Into<String>, size: f32) -> Self {
        self.default_font = font.into();
        self.default_font_size = size;
        self
    }

    /// Replace the labels.
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Check the options before a run.
    ///
    /// An unknown specifier in `date_format` is rejected here, since chrono
    /// only reports it when the date is formatted.
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::Other(format!(
                "Invalid date format: {}",
                self.date_format
            )));
        }
        Ok(())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_image_placeholders: false,
            date_format: "%Y-%m-%d %H:%M".to_string(),
            default_font: "Times New Roman".to_string(),
            default_font_size: 12.0,
            labels: Labels::default(),
        }
    }
}

/// Localized phrases used in generated content.
///
/// `{width}`, `{height}`, `{from}` and `{to}` are substituted where noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Labels {
    /// Plain-text stand-in for an image (`{width}`, `{height}`)
    pub image: String,
    pub checked: String,
    pub unchecked: String,
    /// Date range (`{from}`, `{to}`)
    pub date_range: String,
    /// Name of the reverse-relation pseudo property
    pub referenced_by: String,
    /// Heading of the citation list
    pub citations: String,
    /// Column title for the citing text
    pub citation_text: String,
    /// Column title for the cited passage
    pub citation_passage: String,
    /// Shown where a map could not be rasterized
    pub no_raster: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            image: "[image {width}x{height}]".to_string(),
            checked: "yes".to_string(),
            unchecked: "no".to_string(),
            date_range: "{from} – {to}".to_string(),
            referenced_by: "Referenced by".to_string(),
            citations: "Citations".to_string(),
            citation_text: "Text".to_string(),
            citation_passage: "Passage".to_string(),
            no_raster: "[map not available]".to_string(),
        }
    }
}

impl Labels {
    /// Image phrase for the given size.
    pub fn image_phrase(&self, width: u32, height: u32) -> String {
        self.image
            .replace("{width}", &width.to_string())
            .replace("{height}", &height.to_string())
    }

    /// Date range phrase.
    pub fn date_range_phrase(&self, from: &str, to: &str) -> String {
        self.date_range.replace("{from}", from).replace("{to}", to)
    }
}
