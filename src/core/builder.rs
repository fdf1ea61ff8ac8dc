//! Map builder for fluent API configuration
//!
//! Assembles a [`MapLifecycleManager`] from a config, a dataset catalog and an
//! overlay loader, falling back to the flood catalog and the HTTP loader.

use crate::{
    animation::EasingType,
    catalog::{DatasetCatalog, StaticCatalog},
    core::{config::MapConfig, geo::Point, lifecycle::MapLifecycleManager},
    tiles::loader::{HttpOverlayLoader, OverlayLoader},
    Result,
};

/// Builder for creating and configuring lifecycle managers
#[derive(Default)]
pub struct MapBuilder {
    config: MapConfig,
    catalog: Option<Box<dyn DatasetCatalog>>,
    loader: Option<Box<dyn OverlayLoader>>,
}

impl MapBuilder {
    /// Create a new MapBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: MapConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `catalog` instead of the built-in flood datasets
    pub fn with_catalog(mut self, catalog: Box<dyn DatasetCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use `loader` instead of fetching overlays over HTTP
    pub fn with_loader(mut self, loader: Box<dyn OverlayLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the base layer tile template
    pub fn with_base_template(mut self, template: &str, max_zoom: u8) -> Self {
        self.config.base.url_template = template.to_string();
        self.config.base.max_zoom = max_zoom;
        self
    }

    /// Set the initial center and zoom level
    pub fn with_view(mut self, center: Point, zoom: f64) -> Self {
        self.config.view.center = center.into();
        self.config.view.zoom = zoom;
        self
    }

    pub fn with_zoom_limits(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.config.view.min_zoom = min_zoom;
        self.config.view.max_zoom = max_zoom;
        self
    }

    /// Set the overlay service endpoint and image format
    pub fn with_overlay_service(mut self, url: &str, format: &str) -> Self {
        self.config.overlay.url = url.to_string();
        self.config.overlay.format = format.to_string();
        self
    }

    /// Set how the view moves onto a freshly loaded overlay
    pub fn with_fit_animation(mut self, duration_ms: u64, easing: EasingType) -> Self {
        self.config.overlay.fit_duration_ms = duration_ms;
        self.config.overlay.fit_easing = easing;
        self
    }

    /// Validate the configuration and build the manager
    pub fn build(self) -> Result<MapLifecycleManager> {
        self.config.validate()?;

        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Box::new(StaticCatalog::flood()),
        };
        let loader = match self.loader {
            Some(loader) => loader,
            None => Box::new(HttpOverlayLoader::new()?),
        };

        Ok(MapLifecycleManager::new(self.config, catalog, loader))
    }
}
