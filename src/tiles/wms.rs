//! WMS `GetMap` request construction for overlay images.

use crate::core::geo::Extent;
use crate::{MapError, Result};
use reqwest::Url;
use std::str::FromStr;

/// Resolution WMS servers assume when no DPI hint is sent.
const DEFAULT_WMS_DPI: f64 = 90.0;

/// Server implementation behind the endpoint; decides how DPI hints are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerType {
    GeoServer,
    MapServer,
    Qgis,
    Carmenta,
}

impl FromStr for ServerType {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "geoserver" => Ok(Self::GeoServer),
            "mapserver" => Ok(Self::MapServer),
            "qgis" => Ok(Self::Qgis),
            "carmentaserver" => Ok(Self::Carmenta),
            other => Err(MapError::OverlayConstruction(format!(
                "unsupported server type '{}'",
                other
            ))),
        }
    }
}

/// Parameters of one overlay image source
#[derive(Debug, Clone, PartialEq)]
pub struct WmsSource {
    endpoint: Url,
    layer: String,
    format: String,
    server_type: Option<ServerType>,
    version: String,
    crs: String,
    pixel_ratio: f64,
}

impl WmsSource {
    /// Validates the endpoint and parameters. Every failure here is an
    /// [`MapError::OverlayConstruction`].
    pub fn new(url: &str, layer: &str, format: &str, server_type: Option<&str>) -> Result<Self> {
        let endpoint = Url::parse(url)
            .map_err(|e| MapError::OverlayConstruction(format!("invalid endpoint '{}': {}", url, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(MapError::OverlayConstruction(format!(
                "endpoint '{}' is not http(s)",
                url
            )));
        }
        if layer.trim().is_empty() || layer.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(MapError::OverlayConstruction(format!(
                "invalid layer name '{}'",
                layer
            )));
        }
        if !format.contains('/') {
            return Err(MapError::OverlayConstruction(format!(
                "invalid output format '{}'",
                format
            )));
        }
        let server_type = server_type.map(ServerType::from_str).transpose()?;

        Ok(Self {
            endpoint,
            layer: layer.to_string(),
            format: format.to_string(),
            server_type,
            version: crate::core::constants::DEFAULT_WMS_VERSION.to_string(),
            crs: crate::core::constants::DEFAULT_CRS.to_string(),
            pixel_ratio: 1.0,
        })
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_crs(mut self, crs: &str) -> Self {
        self.crs = crs.to_string();
        self
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn server_type(&self) -> Option<ServerType> {
        self.server_type
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds the `GetMap` URL for an image covering `extent` at `width`x`height` pixels
    pub fn get_map_url(&self, extent: &Extent, width: u32, height: u32) -> Result<Url> {
        if !extent.is_valid() || extent.is_empty() {
            return Err(MapError::OverlayConstruction(format!(
                "cannot request an image for extent {:?}",
                extent
            )));
        }
        if width == 0 || height == 0 {
            return Err(MapError::OverlayConstruction(format!(
                "cannot request a {}x{} image",
                width, height
            )));
        }

        let v13 = version_at_least_1_3(&self.version);
        // WMS 1.3 uses latitude-first axis order for EPSG:4326
        let bbox = if v13 && self.crs.eq_ignore_ascii_case("EPSG:4326") {
            format!("{},{},{},{}", extent.min_y, extent.min_x, extent.max_y, extent.max_x)
        } else {
            extent.to_bbox_param()
        };

        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("SERVICE", "WMS")
                .append_pair("VERSION", &self.version)
                .append_pair("REQUEST", "GetMap")
                .append_pair("FORMAT", &self.format)
                .append_pair("TRANSPARENT", "true")
                .append_pair("LAYERS", &self.layer)
                .append_pair(if v13 { "CRS" } else { "SRS" }, &self.crs)
                .append_pair("STYLES", "")
                .append_pair("WIDTH", &width.to_string())
                .append_pair("HEIGHT", &height.to_string())
                .append_pair("BBOX", &bbox);

            if self.pixel_ratio != 1.0 {
                let dpi = DEFAULT_WMS_DPI * self.pixel_ratio;
                match self.server_type {
                    Some(ServerType::GeoServer) => {
                        query.append_pair("FORMAT_OPTIONS", &format!("dpi:{}", dpi.round()));
                    }
                    Some(ServerType::MapServer) => {
                        query.append_pair("MAP_RESOLUTION", &dpi.to_string());
                    }
                    Some(ServerType::Carmenta) | Some(ServerType::Qgis) => {
                        query.append_pair("DPI", &dpi.to_string());
                    }
                    None => {}
                }
            }
        }
        Ok(url)
    }
}

fn version_at_least_1_3(version: &str) -> bool {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    (major, minor) >= (1, 3)
}
