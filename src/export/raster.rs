//! Asynchronous map rasterization.
//!
//! Every map property of every exported object is turned into one overview
//! image plus one detail image per marker. All requests are launched
//! together and joined; a failed request degrades to "no raster" for that
//! image only.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::Engine;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{GeoPoint, MapValue, ObjectId, PropertyId};

/// Produces PNG images of map regions.
#[async_trait(?Send)]
pub trait MapRasterizer {
    /// Rasterize one map view.
    async fn rasterize(&self, request: &RasterRequest) -> Result<RasterImage>;
}

/// One map view to rasterize.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRequest {
    pub center: GeoPoint,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    /// Marker to draw, for detail views
    pub marker: Option<GeoPoint>,
}

/// A rasterized map view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    /// The image as a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Image sizes used for map rasterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RasterSettings {
    pub overview_width: u32,
    pub overview_height: u32,
    pub detail_width: u32,
    pub detail_height: u32,
    /// Zoom levels added to the map zoom for detail views
    pub detail_zoom_offset: u8,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            overview_width: 640,
            overview_height: 400,
            detail_width: 320,
            detail_height: 200,
            detail_zoom_offset: 8,
        }
    }
}

const MAX_ZOOM: u8 = 19;

/// A map property to rasterize.
#[derive(Debug, Clone)]
pub struct MapJob {
    pub object: ObjectId,
    pub property: PropertyId,
    pub value: MapValue,
}

/// Raster results for one map property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapRaster {
    /// `None` if there was nothing to center on or rasterization failed
    pub overview: Option<RasterImage>,
    /// One entry per marker, in marker order
    pub details: Vec<Option<RasterImage>>,
}

/// Raster results of a run, keyed by object and property.
#[derive(Debug, Clone, Default)]
pub struct RasterCache {
    maps: HashMap<(ObjectId, PropertyId), MapRaster>,
    failures: u32,
}

impl RasterCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Results for a map property, if it was rasterized.
    pub fn get(&self, object: &str, property: &str) -> Option<&MapRaster> {
        self.maps.get(&(object.to_string(), property.to_string()))
    }

    /// Number of requests that degraded to "no raster".
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Number of rasterized map properties.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Check if nothing was rasterized.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

enum Slot {
    Overview,
    Detail(usize),
}

/// Rasterize every job, waiting for all requests to settle.
pub async fn rasterize_all(
    rasterizer: &dyn MapRasterizer,
    jobs: &[MapJob],
    settings: &RasterSettings,
) -> RasterCache {
    let mut requests: Vec<(usize, Slot, RasterRequest)> = Vec::new();
    for (index, job) in jobs.iter().enumerate() {
        if let Some(center) = job.value.overview_center() {
            requests.push((
                index,
                Slot::Overview,
                RasterRequest {
                    center,
                    zoom: job.value.zoom.min(MAX_ZOOM),
                    width: settings.overview_width,
                    height: settings.overview_height,
                    marker: None,
                },
            ));
        }
        let detail_zoom = job
            .value
            .zoom
            .saturating_add(settings.detail_zoom_offset)
            .min(MAX_ZOOM);
        for (marker, m) in job.value.markers.iter().enumerate() {
            requests.push((
                index,
                Slot::Detail(marker),
                RasterRequest {
                    center: m.position,
                    zoom: detail_zoom,
                    width: settings.detail_width,
                    height: settings.detail_height,
                    marker: Some(m.position),
                },
            ));
        }
    }

    log::debug!("Rasterizing {} map views for {} maps", requests.len(), jobs.len());
    let results = join_all(requests.iter().map(|(_, _, r)| rasterizer.rasterize(r))).await;

    let mut rasters: Vec<MapRaster> = jobs
        .iter()
        .map(|job| MapRaster {
            overview: None,
            details: vec![None; job.value.markers.len()],
        })
        .collect();
    let mut failures = 0;

    for ((index, slot, _), result) in requests.into_iter().zip(results) {
        let image = match result {
            Ok(image) => Some(image),
            Err(e) => {
                let job = &jobs[index];
                log::warn!(
                    "Map {} of object {} not rasterized: {}",
                    job.property,
                    job.object,
                    e
                );
                failures += 1;
                None
            }
        };
        match slot {
            Slot::Overview => rasters[index].overview = image,
            Slot::Detail(marker) => rasters[index].details[marker] = image,
        }
    }

    let maps = jobs
        .iter()
        .zip(rasters)
        .map(|(job, raster)| ((job.object.clone(), job.property.clone()), raster))
        .collect();

    RasterCache { maps, failures }
}
