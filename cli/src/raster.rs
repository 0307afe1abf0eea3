//! Map rasterization through a static-map HTTP service.

use async_trait::async_trait;
use reqwest::Client;

use manuscript::{Error, MapRasterizer, RasterImage, RasterRequest};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Fetches map images from a URL template.
///
/// The template may contain `{lat}`, `{lon}`, `{zoom}`, `{width}`,
/// `{height}` and `{marker}`; the marker expands to `lat,lon` for detail
/// views and to nothing for overviews.
pub struct HttpMapRasterizer {
    client: Client,
    template: String,
}

impl HttpMapRasterizer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            template: template.into(),
        }
    }

    /// The request URL for a map view.
    pub fn url(&self, request: &RasterRequest) -> String {
        let marker = request
            .marker
            .map(|m| format!("{:.6},{:.6}", m.lat, m.lon))
            .unwrap_or_default();
        self.template
            .replace("{lat}", &format!("{:.6}", request.center.lat))
            .replace("{lon}", &format!("{:.6}", request.center.lon))
            .replace("{zoom}", &request.zoom.to_string())
            .replace("{width}", &request.width.to_string())
            .replace("{height}", &request.height.to_string())
            .replace("{marker}", &marker)
    }
}

#[async_trait(?Send)]
impl MapRasterizer for HttpMapRasterizer {
    async fn rasterize(&self, request: &RasterRequest) -> manuscript::Result<RasterImage> {
        let url = self.url(request);
        log::debug!("Fetching map {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Raster(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Raster(format!("{} returned {}", url, response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Raster(e.to_string()))?;
        if !bytes.starts_with(PNG_SIGNATURE) {
            return Err(Error::Raster(format!("{} did not return a PNG", url)));
        }

        Ok(RasterImage {
            png: bytes.to_vec(),
            width: request.width,
            height: request.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manuscript::model::GeoPoint;

    #[test]
    fn test_url_template() {
        let rasterizer =
            HttpMapRasterizer::new("https://maps.test/{zoom}?c={lat},{lon}&s={width}x{height}&m={marker}");
        let request = RasterRequest {
            center: GeoPoint::new(52.5, 13.4),
            zoom: 12,
            width: 320,
            height: 200,
            marker: Some(GeoPoint::new(52.5, 13.4)),
        };
        assert_eq!(
            rasterizer.url(&request),
            "https://maps.test/12?c=52.500000,13.400000&s=320x200&m=52.500000,13.400000"
        );

        let overview = RasterRequest {
            marker: None,
            ..request
        };
        assert!(rasterizer.url(&overview).ends_with("&m="));
    }
}
