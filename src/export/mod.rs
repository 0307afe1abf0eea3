//! The export pipeline.
//!
//! A run goes through fixed stages, each finishing before the next begins:
//!
//! 1. compute the selection sets
//! 2. rasterize the maps of the selected objects (HTML and RTF only)
//! 3. render every selected text through the text templates
//! 4. render every selected object through the property and object templates
//! 5. expand the document template around both blocks
//! 6. finalize with the format's headers

mod objects;
mod output;
mod package;
mod raster;
mod selection;

pub use objects::{
    citations, gather_properties, inline_value, map_ops, object_path, render_citations,
    reverse_relations, Citation, ObjectProperty, REFERENCED_BY,
};
pub use output::{ExportOutput, RecentExport, RecentExportList, RecentExports};
pub use package::{DocxPackager, ZipPackager};
pub use raster::{
    rasterize_all, MapJob, MapRaster, MapRasterizer, RasterCache, RasterImage, RasterRequest,
    RasterSettings,
};
pub use selection::Selection;

use chrono::{DateTime, Utc};
use futures::executor::block_on;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    Delta, Insert, Object, Op, Profile, ProjectSource, PropertyKind, PropertyValue, Text,
};
use crate::render::{
    renderer_for, tables_for, DocumentInfo, ExportStats, Preview, RenderContext, RenderOptions,
    Renderer, ResourceTables,
};
use crate::template::{
    strip_newlines, DocumentScope, ObjectScope, PlaceholderRegistry, PropertyScope, TextScope,
};

/// Options of an export run besides the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    pub render: RenderOptions,

    /// Network is available
    pub online: bool,

    /// Rasterize map properties (HTML and RTF)
    pub rasterize_maps: bool,

    pub raster: RasterSettings,

    /// Timestamp used for the document date; defaults to now
    pub exported_at: Option<DateTime<Utc>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            online: true,
            rasterize_maps: true,
            raster: RasterSettings::default(),
            exported_at: None,
        }
    }
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set render options.
    pub fn with_render(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    /// Set whether the network is available.
    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// Enable or disable map rasterization.
    pub fn with_rasterize_maps(mut self, rasterize: bool) -> Self {
        self.rasterize_maps = rasterize;
        self
    }

    /// Set raster image sizes.
    pub fn with_raster(mut self, raster: RasterSettings) -> Self {
        self.raster = raster;
        self
    }

    /// Fix the export timestamp.
    pub fn with_exported_at(mut self, at: DateTime<Utc>) -> Self {
        self.exported_at = Some(at);
        self
    }
}

/// Rendered body of a run before finalization.
struct Rendered {
    body: String,
    tables: ResourceTables,
    stats: ExportStats,
    info: DocumentInfo,
}

/// Drives one export of a project according to a profile.
pub struct Exporter<'a> {
    source: &'a dyn ProjectSource,
    profile: &'a Profile,
    options: ExportOptions,
    registry: PlaceholderRegistry,
    rasterizer: Option<&'a dyn MapRasterizer>,
}

impl<'a> Exporter<'a> {
    /// Create an exporter with default options and the built-in resolvers.
    pub fn new(source: &'a dyn ProjectSource, profile: &'a Profile) -> Self {
        Self {
            source,
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

    /// Replace the placeholder registry.
    pub fn with_registry(mut self, registry: PlaceholderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the map rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: &'a dyn MapRasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Run the export.
    pub async fn run(&self) -> Result<ExportOutput> {
        let format = self.profile.format;
        let ctx = self.context();
        let renderer = renderer_for(format, ctx);
        let rendered = self.render(renderer.as_ref()).await?;
        let body = renderer.finalize(rendered.body, &rendered.tables, &rendered.info)?;

        log::info!(
            "Exported {} texts and {} objects as {}",
            rendered.stats.text_count,
            rendered.stats.object_count,
            format
        );
        Ok(ExportOutput {
            format,
            body,
            stats: rendered.stats,
        })
    }

    /// Run the export on the current thread.
    pub fn run_blocking(&self) -> Result<ExportOutput> {
        block_on(self.run())
    }

    /// Render the body without finalizing, for a preview collaborator.
    pub async fn preview(&self) -> Result<Preview> {
        let renderer = renderer_for(self.profile.format, self.context());
        let rendered = self.render(renderer.as_ref()).await?;
        Ok(Preview {
            format: self.profile.format,
            body: rendered.body,
            fonts: rendered.tables.fonts().to_vec(),
            formats: rendered.tables.formats(),
            objects: rendered.tables.objects(),
            stats: rendered.stats,
        })
    }

    /// Render a preview on the current thread.
    pub fn preview_blocking(&self) -> Result<Preview> {
        block_on(self.preview())
    }

    fn context(&self) -> RenderContext<'_> {
        RenderContext::new(self.source, &self.options.render)
            .with_text_formats(self.profile.use_text_formats)
            .with_object_formats(self.profile.use_object_formats)
    }

    async fn render(&self, renderer: &dyn Renderer) -> Result<Rendered> {
        self.options.render.validate()?;
        let format = self.profile.format;
        let exported_at = self.options.exported_at.unwrap_or_else(Utc::now);
        log::info!(
            "Starting {} export of '{}' with profile '{}'",
            format,
            self.source.info().name,
            self.profile.name
        );

        let selection = Selection::compute(self.source, self.profile);

        let rasters = self.rasterize(&selection).await;

        let mut tables = tables_for(format, &self.options.render);
        let mut stats = ExportStats::new();
        stats.raster_failures = rasters.failures();

        let texts = self.render_texts(&selection, renderer, &mut tables, &mut stats)?;
        log::debug!("Rendered texts block ({} bytes)", texts.len());

        let objects = self.render_objects(&selection, &rasters, renderer, &mut tables, &mut stats)?;
        log::debug!("Rendered objects block ({} bytes)", objects.len());

        let info = self.source.info();
        let scope = DocumentScope {
            format,
            project: info.name.clone(),
            author: info.author.clone(),
            texts,
            objects,
            stats: stats.clone(),
            exported_at,
            date_format: self.options.render.date_format.clone(),
        };
        let document = self.registry.expand(&self.profile.templates.document, &scope);
        let body = renderer.render(&document.ops, &mut tables)?;

        Ok(Rendered {
            body,
            tables,
            stats,
            info: DocumentInfo {
                title: info.name.clone(),
                author: info.author.clone(),
                created: exported_at,
            },
        })
    }

    async fn rasterize(&self, selection: &Selection<'_>) -> RasterCache {
        let Some(rasterizer) = self.rasterizer else {
            return RasterCache::new();
        };
        if !self.profile.format.embeds_images() {
            return RasterCache::new();
        }
        if !self.options.online || !self.options.rasterize_maps {
            log::debug!("Map rasterization disabled");
            return RasterCache::new();
        }

        let labels = &self.options.render.labels;
        let jobs: Vec<MapJob> = selection
            .objects
            .iter()
            .flat_map(|object| {
                gather_properties(self.source, object, labels)
                    .into_iter()
                    .filter_map(move |property| match property.value {
                        Some(PropertyValue::Map(value)) => Some(MapJob {
                            object: object.id.clone(),
                            property: property.definition.id,
                            value,
                        }),
                        _ => None,
                    })
            })
            .collect();
        if jobs.is_empty() {
            return RasterCache::new();
        }

        rasterize_all(rasterizer, &jobs, &self.options.raster).await
    }

    fn render_texts(
        &self,
        selection: &Selection<'_>,
        renderer: &dyn Renderer,
        tables: &mut ResourceTables,
        stats: &mut ExportStats,
    ) -> Result<String> {
        let mut block = String::new();
        for text in &selection.texts {
            if self.profile.ignore_empty_texts && text.delta.is_blank() {
                log::debug!("Skipping empty text {}", text.id);
                continue;
            }

            let ops = self.text_content_ops(text, selection);
            let content = renderer.render(&ops, tables)?;

            let plain = text.delta.plain_text();
            let words = plain.split_whitespace().count() as u32;
            stats.add_text(&plain);
            if self.profile.format.embeds_images() {
                let images = ops
                    .iter()
                    .filter(|op| matches!(op.insert, Insert::Image { .. }))
                    .count();
                stats.add_images(images);
            }

            let scope = TextScope {
                format: self.profile.format,
                id: text.id.clone(),
                name: text.name.clone(),
                created: text.created,
                changed: text.changed,
                content,
                word_count: words,
                date_format: self.options.render.date_format.clone(),
            };
            let expanded = self.registry.expand(&self.profile.templates.text, &scope);
            block.push_str(&renderer.render(&expanded.ops, tables)?);
        }
        Ok(block)
    }

    /// A text's ops with unselected object references removed and the
    /// object start/end templates spliced around object spans.
    fn text_content_ops(&self, text: &Text, selection: &Selection<'_>) -> Vec<Op> {
        let templates = &self.profile.templates;
        let mut ops = Vec::with_capacity(text.delta.ops.len());
        let mut open: Vec<String> = Vec::new();

        for op in &text.delta.ops {
            let mut op = op.clone();
            op.attributes.retain_objects(|id| selection.keeps_text_object(id));
            let current: Vec<String> = op.attributes.objects().map(str::to_string).collect();

            let (still_open, closed): (Vec<String>, Vec<String>) =
                open.into_iter().partition(|id| current.contains(id));
            for id in closed.iter().rev() {
                ops.extend(self.wrapper(&templates.object_end, id));
            }
            open = still_open;

            for id in current {
                if !open.contains(&id) {
                    ops.extend(self.wrapper(&templates.object_start, &id));
                    open.push(id);
                }
            }
            ops.push(op);
        }
        for id in open.iter().rev() {
            ops.extend(self.wrapper(&templates.object_end, id));
        }
        ops
    }

    fn wrapper(&self, template: &Delta, id: &str) -> Vec<Op> {
        if template.is_empty() {
            return Vec::new();
        }
        let name = self
            .source
            .object(id)
            .map(|o| o.name.clone())
            .unwrap_or_default();
        let scope = ObjectScope::wrapper(self.profile.format, id, name);
        strip_newlines(self.registry.expand(template, &scope)).ops
    }

    fn render_objects(
        &self,
        selection: &Selection<'_>,
        rasters: &RasterCache,
        renderer: &dyn Renderer,
        tables: &mut ResourceTables,
        stats: &mut ExportStats,
    ) -> Result<String> {
        let labels = &self.options.render.labels;
        let mut block = String::new();

        for object in &selection.objects {
            let mut properties = String::new();
            for property in gather_properties(self.source, object, labels) {
                let value = self.property_value(object, &property, rasters, renderer, tables, stats)?;
                let scope = PropertyScope {
                    format: self.profile.format,
                    id: property.definition.id.clone(),
                    name: property.definition.name.clone(),
                    kind: property.definition.kind,
                    value,
                };
                let expanded = self.registry.expand(&self.profile.templates.properties, &scope);
                properties.push_str(&renderer.render(&expanded.ops, tables)?);
            }

            let found = citations(object, &selection.citation_texts);
            let citations = render_citations(&found, renderer, tables, labels)?;

            let scope = ObjectScope {
                format: self.profile.format,
                id: object.id.clone(),
                name: object.name.clone(),
                path: object_path(self.source, object),
                properties,
                citations,
            };
            let expanded = self.registry.expand(&self.profile.templates.object, &scope);
            block.push_str(&renderer.render(&expanded.ops, tables)?);
            stats.add_object();
        }
        Ok(block)
    }

    /// The value op of a property: plain text for inline values, a cooked
    /// block of rendered content for rich text and maps.
    fn property_value(
        &self,
        object: &Object,
        property: &ObjectProperty,
        rasters: &RasterCache,
        renderer: &dyn Renderer,
        tables: &mut ResourceTables,
        stats: &mut ExportStats,
    ) -> Result<Op> {
        let labels = &self.options.render.labels;
        let Some(value) = &property.value else {
            return Ok(Op::text(""));
        };
        if property.definition.kind == PropertyKind::Header {
            return Ok(Op::text(""));
        }

        match value {
            PropertyValue::Editor(delta) => {
                let content = renderer.render(&delta.ops, tables)?;
                Ok(Op::cooked(content, true))
            }
            PropertyValue::Map(map) => {
                stats.map_count += 1;
                let raster = rasters.get(&object.id, &property.definition.id);
                if let Some(raster) = raster {
                    let images = raster.details.iter().flatten().count()
                        + usize::from(raster.overview.is_some());
                    stats.add_images(images);
                }
                let ops = map_ops(map, raster, labels);
                let content = renderer.render(&ops, tables)?;
                Ok(Op::cooked(content, true))
            }
            other => Ok(Op::text(inline_value(self.source, other, labels))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExportFormat, Project, TextObjectSelection};
    use crate::render::ExportBody;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn fixed() -> ExportOptions {
        ExportOptions::new().with_exported_at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    fn project() -> Project {
        let mut project = Project::new("Novel");
        project.add_object(Object::new("O1", "Anna"));
        project.add_text(Text::new(
            "T1",
            "Start",
            Delta::from_ops(vec![
                Op::text("Hello "),
                Op::text("Anna").with_object("O1"),
                Op::text("!\n"),
            ]),
        ));
        project
    }

    fn txt_profile() -> Profile {
        let mut profile = Profile::for_format(ExportFormat::Txt);
        profile.templates.object_start = Delta::from_ops(vec![Op::text("[\n")]);
        profile.templates.object_end = Delta::from_ops(vec![Op::text("]")]);
        profile
    }

    #[test]
    fn test_wrappers_surround_object_spans() {
        let project = project();
        let profile = txt_profile();
        let exporter = Exporter::new(&project, &profile).with_options(fixed());
        let output = exporter.run_blocking().unwrap();
        assert_eq!(
            output.as_text().unwrap(),
            "Start\nHello [Anna]!\nAnna\nCitations\nStart: Anna\n"
        );
        assert_eq!(output.stats.text_count, 1);
        assert_eq!(output.stats.object_count, 1);
    }

    #[test]
    fn test_unselected_text_objects_get_no_wrappers() {
        let project = project();
        let profile = txt_profile().with_text_objects(TextObjectSelection::Checked);
        let exporter = Exporter::new(&project, &profile).with_options(fixed());
        let output = exporter.run_blocking().unwrap();
        assert!(output.as_text().unwrap().starts_with("Start\nHello Anna!\n"));
    }

    #[test]
    fn test_docx_body() {
        let project = project();
        let profile = Profile::for_format(ExportFormat::Docx);
        let output = Exporter::new(&project, &profile)
            .with_options(fixed())
            .run_blocking()
            .unwrap();
        let ExportBody::Docx(document) = output.body else {
            panic!("expected a docx body");
        };
        assert_eq!(document.paragraphs[0], "Start");
        assert_eq!(document.paragraphs[1], "Hello Anna!");
        assert_eq!(document.title, "Novel");
    }
}
