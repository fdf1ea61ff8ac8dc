//! Configuration for the base layer, the initial view and the overlay service
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides.

use crate::animation::EasingType;
use crate::core::constants::*;
use crate::core::geo::Point;
use crate::core::view::FitOptions;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub base: BaseLayerConfig,
    pub view: ViewConfig,
    pub overlay: OverlayServiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseLayerConfig {
    pub url_template: String,
    pub max_zoom: u8,
}

impl Default for BaseLayerConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_BASE_URL_TEMPLATE.to_string(),
            max_zoom: DEFAULT_BASE_MAX_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Initial center in map units
    pub center: [f64; 2],
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Viewport size in pixels
    pub size: [f64; 2],
}

impl ViewConfig {
    pub fn center(&self) -> Point {
        Point::from(self.center)
    }

    pub fn size(&self) -> Point {
        Point::from(self.size)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            size: DEFAULT_VIEWPORT_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayServiceConfig {
    pub url: String,
    pub format: String,
    pub server_type: Option<String>,
    pub version: String,
    pub crs: String,
    pub pixel_ratio: f64,
    pub fit_duration_ms: u64,
    /// Pixels kept free around the fitted overlay
    pub fit_padding: f64,
    pub fit_easing: EasingType,
}

impl OverlayServiceConfig {
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            duration: Duration::from_millis(self.fit_duration_ms),
            padding: self.fit_padding,
            easing: self.fit_easing,
        }
    }
}

impl Default for OverlayServiceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OVERLAY_URL.to_string(),
            format: DEFAULT_OVERLAY_FORMAT.to_string(),
            server_type: Some(DEFAULT_SERVER_TYPE.to_string()),
            version: DEFAULT_WMS_VERSION.to_string(),
            crs: DEFAULT_CRS.to_string(),
            pixel_ratio: 1.0,
            fit_duration_ms: DEFAULT_FIT_DURATION_MS,
            fit_padding: 0.0,
            fit_easing: EasingType::EaseOut,
        }
    }
}

impl MapConfig {
    /// Parses and validates a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        log::debug!("loading map config from {}", path.display());
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.base.url_template.contains(placeholder) {
                return Err(MapError::Config(format!(
                    "base.url_template is missing {}",
                    placeholder
                )));
            }
        }
        if self.overlay.url.trim().is_empty() {
            return Err(MapError::Config("overlay.url must not be empty".to_string()));
        }
        if self.overlay.format.trim().is_empty() {
            return Err(MapError::Config("overlay.format must not be empty".to_string()));
        }
        if !(self.overlay.pixel_ratio > 0.0) {
            return Err(MapError::Config("overlay.pixel_ratio must be positive".to_string()));
        }
        if self.overlay.fit_padding < 0.0 {
            return Err(MapError::Config("overlay.fit_padding must not be negative".to_string()));
        }
        let view = &self.view;
        if [view.zoom, view.min_zoom, view.max_zoom].iter().any(|z| !z.is_finite()) {
            return Err(MapError::Config("view zoom levels must be finite".to_string()));
        }
        if view.center.iter().any(|v| !v.is_finite()) {
            return Err(MapError::Config("view.center must be finite".to_string()));
        }
        if !(self.view.min_zoom <= self.view.max_zoom) {
            return Err(MapError::Config(format!(
                "view.min_zoom {} exceeds view.max_zoom {}",
                self.view.min_zoom, self.view.max_zoom
            )));
        }
        if self.view.size.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(MapError::Config("view.size must be positive".to_string()));
        }
        if self.base.max_zoom > MAX_TILE_ZOOM {
            return Err(MapError::Config(format!(
                "base.max_zoom {} exceeds {}",
                self.base.max_zoom, MAX_TILE_ZOOM
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_world_view() {
        let config = MapConfig::default();
        assert_eq!(config.view.center(), Point::new(0.0, 0.0));
        assert_eq!(config.view.zoom, 0.0);
        assert_eq!(config.overlay.fit_options().duration, Duration::from_millis(1000));
        assert_eq!(config.overlay.format, "image/png");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MapConfig::from_json_str(
            r#"{"view": {"zoom": 3.0}, "overlay": {"fit_duration_ms": 250, "fit_easing": "linear"}}"#,
        )
        .unwrap();
        assert_eq!(config.view.zoom, 3.0);
        assert_eq!(config.view.size, DEFAULT_VIEWPORT_SIZE);
        assert_eq!(config.overlay.fit_duration_ms, 250);
        assert_eq!(config.overlay.fit_easing, EasingType::Linear);
        assert_eq!(config.overlay.url, DEFAULT_OVERLAY_URL);
    }

    #[test]
    fn test_validation_errors() {
        let bad = [
            r#"{"base": {"url_template": "https://tiles.example.com/{z}/{x}.png"}}"#,
            r#"{"overlay": {"url": ""}}"#,
            r#"{"overlay": {"format": " "}}"#,
            r#"{"view": {"min_zoom": 5.0, "max_zoom": 2.0}}"#,
            r#"{"view": {"size": [0.0, 600.0]}}"#,
            r#"{"base": {"max_zoom": 40}}"#,
        ];
        for json in bad {
            assert!(
                matches!(MapConfig::from_json_str(json), Err(MapError::Config(_))),
                "{}",
                json
            );
        }
    }

    #[test]
    fn test_non_finite_zoom_is_rejected() {
        let mut config = MapConfig::default();
        config.view.min_zoom = f64::NAN;
        assert!(matches!(config.validate(), Err(MapError::Config(_))));

        let mut config = MapConfig::default();
        config.view.max_zoom = f64::INFINITY;
        assert!(matches!(config.validate(), Err(MapError::Config(_))));

        let mut config = MapConfig::default();
        config.view.zoom = f64::NAN;
        assert!(matches!(config.validate(), Err(MapError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = MapConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, MapError::Io(_)));
    }
}
