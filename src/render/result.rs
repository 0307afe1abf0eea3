//! Run statistics and the preview payload.

use serde::{Deserialize, Serialize};

use crate::model::{ExportFormat, FormatId, ObjectId};

/// Statistics collected during an export run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    /// Number of texts written
    pub text_count: u32,

    /// Number of objects written
    pub object_count: u32,

    /// Approximate word count of exported texts (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count of exported texts (excluding whitespace)
    pub char_count: u32,

    /// Number of embedded images rendered
    pub image_count: u32,

    /// Number of map properties rendered
    pub map_count: u32,

    /// Number of rasterizations that degraded to "no raster"
    pub raster_failures: u32,
}

impl ExportStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment text count and add word and character counts.
    pub fn add_text(&mut self, text: &str) {
        self.text_count += 1;
        self.count_text(text);
    }

    /// Increment object count.
    pub fn add_object(&mut self) {
        self.object_count += 1;
    }

    /// Add rendered images to the image count.
    pub fn add_images(&mut self, count: usize) {
        self.image_count += count as u32;
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }
}

/// Rendered body plus the resources it uses, for a preview collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub format: ExportFormat,

    /// Rendered body without document wrapper
    pub body: String,

    /// Font names in first-use order
    pub fonts: Vec<String>,

    /// Paragraph formats in first-use order
    pub formats: Vec<FormatId>,

    /// Objects whose styles were used, in first-use order
    pub objects: Vec<ObjectId>,

    pub stats: ExportStats,
}

impl Preview {
    /// Serialize for the preview collaborator.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_count_text() {
        let mut stats = ExportStats::new();
        stats.add_text("Call me Ishmael.\nSome years ago");

        assert_eq!(stats.text_count, 1);
        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.char_count, 26);
    }
}
