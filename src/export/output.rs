//! Export results, writing them to disk and the recent-exports list.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::package::DocxPackager;
use crate::error::Result;
use crate::model::ExportFormat;
use crate::render::{ExportBody, ExportStats};

/// Result of a completed export run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutput {
    pub format: ExportFormat,
    pub body: ExportBody,
    pub stats: ExportStats,
}

impl ExportOutput {
    /// The bytes to write, packaging DOCX output with `packager`.
    pub fn to_bytes(&self, packager: &dyn DocxPackager) -> Result<Vec<u8>> {
        match &self.body {
            ExportBody::Text(text) => Ok(text.as_bytes().to_vec()),
            ExportBody::Docx(document) => packager.package(&document.parts()?),
        }
    }

    /// The text content, for text, HTML and RTF output.
    pub fn as_text(&self) -> Option<&str> {
        self.body.as_text()
    }

    /// Write the output to a file.
    ///
    /// A file left partially written by a failed write is not removed.
    pub fn write_to<P: AsRef<Path>>(&self, path: P, packager: &dyn DocxPackager) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes(packager)?;
        let result = File::create(path).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.flush()
        });
        if let Err(e) = result {
            log::error!("Failed to write {}: {}", path.display(), e);
            return Err(e.into());
        }
        log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Write the output to a file without blocking the executor.
    #[cfg(feature = "async")]
    pub async fn write_to_async<P: AsRef<Path>>(
        &self,
        path: P,
        packager: &dyn DocxPackager,
    ) -> Result<()> {
        use tokio::io::AsyncWriteExt;

        let path = path.as_ref();
        let bytes = self.to_bytes(packager)?;
        let result = async {
            let mut file = tokio::fs::File::create(path).await?;
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = result {
            log::error!("Failed to write {}: {}", path.display(), e);
            return Err(e.into());
        }
        log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Write the output and report it to a recent-exports list.
    pub fn save<P: AsRef<Path>>(
        &self,
        path: P,
        packager: &dyn DocxPackager,
        recent: &mut dyn RecentExports,
    ) -> Result<()> {
        let path = path.as_ref();
        self.write_to(path, packager)?;
        recent.record(RecentExport {
            path: path.to_path_buf(),
            format: self.format,
            exported_at: Utc::now(),
        });
        Ok(())
    }
}

/// A completed export as shown in a recent-exports list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentExport {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub exported_at: DateTime<Utc>,
}

/// Receives completed exports.
pub trait RecentExports {
    /// Record a completed export.
    fn record(&mut self, export: RecentExport);
}

/// Bounded in-memory recent-exports list, newest first, one entry per path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentExportList {
    capacity: usize,
    entries: Vec<RecentExport>,
}

impl Default for RecentExportList {
    fn default() -> Self {
        Self::new(10)
    }
}

impl RecentExportList {
    /// Create an empty list holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[RecentExport] {
        &self.entries
    }

    /// Most recent export.
    pub fn latest(&self) -> Option<&RecentExport> {
        self.entries.first()
    }

    /// Number of remembered exports.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no export has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RecentExports for RecentExportList {
    fn record(&mut self, export: RecentExport) {
        self.entries.retain(|e| e.path != export.path);
        self.entries.insert(0, export);
        self.entries.truncate(self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn export(path: &str, day: u32) -> RecentExport {
        RecentExport {
            path: PathBuf::from(path),
            format: ExportFormat::Rtf,
            exported_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_recent_list_dedups_and_bounds() {
        let mut list = RecentExportList::new(2);
        list.record(export("a.rtf", 1));
        list.record(export("b.rtf", 2));
        list.record(export("a.rtf", 3));
        assert_eq!(list.len(), 2);
        assert_eq!(list.latest(), Some(&export("a.rtf", 3)));

        list.record(export("c.rtf", 4));
        let paths: Vec<_> = list.entries().iter().map(|e| e.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["c.rtf", "a.rtf"]);
    }
}
