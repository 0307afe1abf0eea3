//! # manuscript
//!
//! Template-driven export of rich-text manuscripts.
//!
//! A project is a corpus of texts (rich-text deltas) and domain objects
//! (characters, places, items) with scheme-based properties. An export
//! profile selects texts and objects, wraps them in user-authored
//! placeholder templates and renders the result as plain text, HTML, RTF
//! or DOCX.
//!
//! ## Quick Start
//!
//! ```no_run
//! use manuscript::{ExportFormat, Manuscript, Profile, Project};
//!
//! fn main() -> manuscript::Result<()> {
//!     let project = Project::load("novel.json")?;
//!     let profile = Profile::for_format(ExportFormat::Rtf);
//!
//!     let output = Manuscript::new(profile).offline().export(&project)?;
//!     output.write_to("novel.rtf", &manuscript::ZipPackager::new())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Four formats**: plain text, self-contained HTML, RTF, DOCX
//! - **Templates**: placeholders at document, text, object and property level
//! - **Resource tables**: RTF font, color and style tables built during rendering
//! - **Map rasterization**: pluggable async rasterizer for map properties
//! - **Preview mode**: rendered body plus the fonts, formats and objects it uses

pub mod error;
pub mod export;
pub mod model;
pub mod render;
pub mod template;

// Re-export commonly used types
pub use error::{Error, Result};
pub use export::{
    DocxPackager, ExportOptions, ExportOutput, Exporter, MapRasterizer, RasterImage,
    RasterRequest, RasterSettings, RecentExport, RecentExportList, RecentExports, ZipPackager,
};
pub use model::{
    Alignment, Attribute, AttributeSet, CharacterStyle, CitationSelection, Color, Delta,
    EmbeddedImage, ExportFormat, ImageAlign, InlineStyle, Insert, Object, ObjectSelection, Op,
    ParagraphFormat, Profile, Project, ProjectSource, PropertyKind, PropertyValue,
    SchemeProperty, Templates, Text, TextObjectSelection, TextSelection,
};
pub use render::{ExportBody, ExportStats, Labels, Preview, RenderOptions, ResourceTables};
pub use template::PlaceholderRegistry;

use std::path::Path;

/// Export a project with a profile and default options.
///
/// Maps are not rasterized.
///
/// # Example
///
/// ```no_run
/// use manuscript::{export, ExportFormat, Profile, Project};
///
/// let project = Project::load("novel.json").unwrap();
/// let output = export(&project, &Profile::for_format(ExportFormat::Html)).unwrap();
/// println!("{}", output.as_text().unwrap());
/// ```
pub fn export(project: &dyn ProjectSource, profile: &Profile) -> Result<ExportOutput> {
    Exporter::new(project, profile).run_blocking()
}

/// Export a project file with a profile file and write the result.
///
/// The output format is the profile's format.
///
/// # Example
///
/// ```no_run
/// use manuscript::export_file;
///
/// let output = export_file("novel.json", "rtf-profile.json", "novel.rtf").unwrap();
/// println!("{} words", output.stats.word_count);
/// ```
pub fn export_file<P, Q, R>(project: P, profile: Q, output: R) -> Result<ExportOutput>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let project = Project::load(project)?;
    let profile = Profile::load(profile)?;
    let result = export(&project, &profile)?;
    result.write_to(output, &ZipPackager::new())?;
    Ok(result)
}

/// Render a preview of a project with a profile.
pub fn preview(project: &dyn ProjectSource, profile: &Profile) -> Result<Preview> {
    Exporter::new(project, profile).preview_blocking()
}

/// Builder for configuring and running exports.
///
/// # Example
///
/// ```no_run
/// use manuscript::{ExportFormat, Manuscript, Op, Profile, Project};
///
/// let project = Project::load("novel.json")?;
/// let output = Manuscript::new(Profile::for_format(ExportFormat::Txt))
///     .with_document_resolver("subtitle", |_| Op::text("A Draft"))
///     .offline()
///     .export(&project)?;
/// # Ok::<(), manuscript::Error>(())
/// ```
pub struct Manuscript {
    profile: Profile,
    options: ExportOptions,
    registry: PlaceholderRegistry,
    rasterizer: Option<Box<dyn MapRasterizer>>,
}

impl Manuscript {
    /// Create a builder for a profile.
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            options: ExportOptions::default(),
            registry: PlaceholderRegistry::with_defaults(),
            rasterizer: None,
        }
    }

    /// Set export options.
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Set render options.
    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.options.render = render;
        self
    }

    /// Override the output format of the profile.
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.profile.format = format;
        self
    }

    /// Mark the network as unavailable.
    pub fn offline(mut self) -> Self {
        self.options.online = false;
        self
    }

    /// Disable map rasterization.
    pub fn no_raster(mut self) -> Self {
        self.options.rasterize_maps = false;
        self
    }

    /// Set the map rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn MapRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Register an extra document-level resolver.
    pub fn with_document_resolver<F>(mut self, name: &str, resolver: F) -> Self
    where
        F: Fn(&template::DocumentScope) -> Op + Send + Sync + 'static,
    {
        self.registry.document.register(name, resolver);
        self
    }

    /// Replace the placeholder registry.
    pub fn with_registry(mut self, registry: PlaceholderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The profile in use.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    fn exporter<'a>(&'a self, project: &'a dyn ProjectSource) -> Exporter<'a> {
        let exporter = Exporter::new(project, &self.profile)
            .with_options(self.options.clone())
            .with_registry(self.registry.clone());
        match &self.rasterizer {
            Some(rasterizer) => exporter.with_rasterizer(rasterizer.as_ref()),
            None => exporter,
        }
    }

    /// Run the export on the current thread.
    pub fn export(&self, project: &dyn ProjectSource) -> Result<ExportOutput> {
        self.exporter(project).run_blocking()
    }

    /// Run the export.
    pub async fn export_async(&self, project: &dyn ProjectSource) -> Result<ExportOutput> {
        self.exporter(project).run().await
    }

    /// Run the export and write the result.
    pub fn export_to_file<P: AsRef<Path>>(
        &self,
        project: &dyn ProjectSource,
        path: P,
    ) -> Result<ExportOutput> {
        let output = self.export(project)?;
        output.write_to(path, &ZipPackager::new())?;
        Ok(output)
    }

    /// Render a preview.
    pub fn preview(&self, project: &dyn ProjectSource) -> Result<Preview> {
        self.exporter(project).preview_blocking()
    }

    /// Render a preview.
    pub async fn preview_async(&self, project: &dyn ProjectSource) -> Result<Preview> {
        self.exporter(project).preview().await
    }
}
