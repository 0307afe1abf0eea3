//! Object properties and citations.

use indexmap::IndexMap;

use super::raster::MapRaster;
use crate::error::Result;
use crate::model::{
    EmbeddedImage, ExportFormat, ImageAlign, InlineStyle, MapValue, Object, Op, PropertyId,
    PropertyKind, PropertyValue, ProjectSource, SchemeProperty, Text, TextId,
};
use crate::render::{escape_html, Labels, Renderer, ResourceTables};

/// Id of the reverse-relation pseudo property.
pub const REFERENCED_BY: &str = "referencedBy";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A property of an exported object with its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub definition: SchemeProperty,
    pub value: Option<PropertyValue>,
}

/// Properties of an object, including inherited definitions.
///
/// Definitions are gathered along the ancestor chain; the definition
/// nearest to the object wins, while the order is that of first
/// declaration, root first. Values always come from the object itself.
/// Properties without a value are dropped, headers are kept. Objects
/// relating to this one are appended as a relation pseudo property named
/// by `labels.referenced_by`.
pub fn gather_properties(
    source: &dyn ProjectSource,
    object: &Object,
    labels: &Labels,
) -> Vec<ObjectProperty> {
    let mut definitions: IndexMap<PropertyId, SchemeProperty> = IndexMap::new();
    for ancestor in source.ancestry(&object.id).into_iter().rev() {
        for property in &ancestor.scheme {
            definitions.insert(property.id.clone(), property.clone());
        }
    }

    let mut properties: Vec<ObjectProperty> = definitions
        .into_values()
        .filter_map(|definition| {
            let value = object.values.get(&definition.id).cloned();
            let keep = definition.kind == PropertyKind::Header
                || value.as_ref().is_some_and(|v| !v.is_empty());
            keep.then_some(ObjectProperty { definition, value })
        })
        .collect();

    let referencing = reverse_relations(source, object);
    if !referencing.is_empty() {
        properties.push(ObjectProperty {
            definition: SchemeProperty::new(
                REFERENCED_BY,
                labels.referenced_by.clone(),
                PropertyKind::Relation,
            ),
            value: Some(PropertyValue::Relation(referencing)),
        });
    }

    properties
}

/// Objects with a relation value pointing at `object`, in tree order.
pub fn reverse_relations(source: &dyn ProjectSource, object: &Object) -> Vec<String> {
    source
        .objects()
        .into_iter()
        .filter(|other| other.id != object.id)
        .filter(|other| {
            other.values.values().any(|value| match value {
                PropertyValue::Relation(ids) => ids.iter().any(|id| *id == object.id),
                _ => false,
            })
        })
        .map(|other| other.id.clone())
        .collect()
}

/// Ancestor names of an object, root first, joined with " / ".
pub fn object_path(source: &dyn ProjectSource, object: &Object) -> String {
    let ancestry = source.ancestry(&object.id);
    let names: Vec<&str> = ancestry
        .iter()
        .skip(1)
        .rev()
        .map(|o| o.name.as_str())
        .collect();
    names.join(" / ")
}

/// Text of a property value that renders inline.
pub fn inline_value(source: &dyn ProjectSource, value: &PropertyValue, labels: &Labels) -> String {
    match value {
        PropertyValue::Text(s) | PropertyValue::Select(s) => s.clone(),
        PropertyValue::Checkbox(true) => labels.checked.clone(),
        PropertyValue::Checkbox(false) => labels.unchecked.clone(),
        PropertyValue::Date(date) => date.format(DATE_FORMAT).to_string(),
        PropertyValue::DateRange { from, to } => {
            let format = |d: &Option<chrono::NaiveDate>| {
                d.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
            };
            labels.date_range_phrase(&format(from), &format(to))
        }
        PropertyValue::Relation(ids) => ids
            .iter()
            .map(|id| match source.object(id) {
                Some(object) => object.name.clone(),
                None => {
                    log::warn!("Relation to unknown object {}", id);
                    id.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", "),
        PropertyValue::Editor(delta) => delta.plain_text(),
        PropertyValue::Map(map) => map
            .markers
            .iter()
            .map(|m| m.label.clone())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Ops describing a map: raster images where available, marker lines
/// otherwise.
pub fn map_ops(map: &MapValue, raster: Option<&MapRaster>, labels: &Labels) -> Vec<Op> {
    let mut ops = Vec::new();
    let image = |image: &super::raster::RasterImage| {
        Op::image(
            EmbeddedImage::new(image.to_data_uri(), image.width, image.height)
                .with_align(ImageAlign::Center),
        )
    };

    match raster {
        Some(raster) => {
            match &raster.overview {
                Some(overview) => ops.push(image(overview)),
                None => ops.push(Op::text(format!("{}\n", labels.no_raster))),
            }
            for (marker, detail) in map.markers.iter().zip(&raster.details) {
                if !marker.label.is_empty() {
                    ops.push(Op::text(format!("{}\n", marker.label)));
                }
                match detail {
                    Some(detail) => ops.push(image(detail)),
                    None => ops.push(Op::text(format!("{}\n", labels.no_raster))),
                }
            }
        }
        None => {
            for marker in &map.markers {
                let position = format!("{:.5}, {:.5}", marker.position.lat, marker.position.lon);
                let line = if marker.label.is_empty() {
                    format!("{}\n", position)
                } else {
                    format!("{} ({})\n", marker.label, position)
                };
                ops.push(Op::text(line));
            }
        }
    }
    ops
}

/// A passage of a citing text attributed to an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub text: TextId,
    pub text_name: String,
    pub passage: String,
}

/// Citations of an object in the given texts, in text order.
///
/// A text cites an object if one of its spans references it; the passage is
/// the concatenated text of all such spans.
pub fn citations(object: &Object, texts: &[&Text]) -> Vec<Citation> {
    texts
        .iter()
        .filter_map(|text| {
            let passage: String = text
                .delta
                .ops
                .iter()
                .filter(|op| op.attributes.has_object(&object.id))
                .filter_map(|op| op.as_text())
                .collect();
            text.delta.references_object(&object.id).then(|| Citation {
                text: text.id.clone(),
                text_name: text.name.clone(),
                passage: passage.trim().to_string(),
            })
        })
        .collect()
}

/// Render a citation list as a fragment of the target format.
///
/// HTML gets a table; other formats get one line per citation below a
/// heading line.
pub fn render_citations(
    citations: &[Citation],
    renderer: &dyn Renderer,
    tables: &mut ResourceTables,
    labels: &Labels,
) -> Result<String> {
    if citations.is_empty() {
        return Ok(String::new());
    }

    if renderer.format() == ExportFormat::Html {
        let mut out = String::from("<table class=\"citations\">\n");
        out.push_str(&format!(
            "<caption>{}</caption>\n<tr><th>{}</th><th>{}</th></tr>\n",
            escape_html(&labels.citations),
            escape_html(&labels.citation_text),
            escape_html(&labels.citation_passage)
        ));
        for citation in citations {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                escape_html(&citation.text_name),
                escape_html(&citation.passage)
            ));
        }
        out.push_str("</table>\n");
        return Ok(out);
    }

    let mut ops = vec![
        Op::text(labels.citations.clone()).with_style(InlineStyle::Bold),
        Op::text("\n"),
    ];
    for citation in citations {
        ops.push(Op::text(citation.text_name.clone()).with_style(InlineStyle::Italic));
        ops.push(Op::text(format!(": {}\n", citation.passage)));
    }
    renderer.render(&ops, tables)
}
