//! Object scheme properties and their values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::delta::{Delta, ObjectId};

/// Identifier of a scheme property.
pub type PropertyId = String;

/// Kind of a scheme property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    /// Section heading, carries no value
    Header,
    /// Single line of text
    Text,
    /// Rich text
    Editor,
    /// Yes / no
    Checkbox,
    /// One of a fixed list of options
    Select,
    /// Calendar date
    Date,
    /// Start and end date
    DateRange,
    /// References to other objects
    Relation,
    /// Geographic map with markers
    Map,
}

/// A property definition in an object's scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeProperty {
    pub id: PropertyId,
    pub name: String,
    pub kind: PropertyKind,
}

impl SchemeProperty {
    /// Create a property definition.
    pub fn new(id: impl Into<PropertyId>, name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }
}

/// The value of a property on one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    Text(String),
    Editor(Delta),
    Checkbox(bool),
    Select(String),
    Date(NaiveDate),
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    Relation(Vec<ObjectId>),
    Map(MapValue),
}

impl PropertyValue {
    /// Check if the value carries no content.
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Text(s) | PropertyValue::Select(s) => s.trim().is_empty(),
            PropertyValue::Editor(delta) => delta.is_blank(),
            PropertyValue::Checkbox(_) | PropertyValue::Date(_) => false,
            PropertyValue::DateRange { from, to } => from.is_none() && to.is_none(),
            PropertyValue::Relation(ids) => ids.is_empty(),
            PropertyValue::Map(map) => map.markers.is_empty() && map.center.is_none(),
        }
    }
}

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A labelled marker on a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub position: GeoPoint,
    #[serde(default)]
    pub label: String,
}

/// Map property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    /// Overview center; falls back to the first marker
    #[serde(default)]
    pub center: Option<GeoPoint>,

    /// Overview zoom level
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    #[serde(default)]
    pub markers: Vec<MapMarker>,
}

fn default_zoom() -> u8 {
    5
}

impl MapValue {
    /// Center of the overview image.
    pub fn overview_center(&self) -> Option<GeoPoint> {
        self.center
            .or_else(|| self.markers.first().map(|m| m.position))
    }
}
