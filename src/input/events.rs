use crate::core::geo::{Extent, Point};

/// Map event types that can be emitted by the map
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Map view has changed (center or zoom)
    ViewChanged { center: Point, zoom: f64 },
    /// Layer was added to the map
    LayerAdd { layer_id: String },
    /// Layer was removed from the map
    LayerRemove { layer_id: String },
    /// Overlay layer was attached for a dataset
    OverlayAdd { layer_id: String, dataset: String },
    /// Overlay layer was detached
    OverlayRemove { layer_id: String },
    /// The current overlay's image finished loading
    OverlayLoaded { layer_id: String, extent: Extent },
    /// The current overlay's image could not be loaded
    OverlayFailed { layer_id: String, reason: String },
    /// The view started moving to frame an extent
    FitStart { extent: Extent },
}

impl MapEvent {
    /// Name listeners subscribe with
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::ViewChanged { .. } => "viewchanged",
            MapEvent::LayerAdd { .. } => "layeradd",
            MapEvent::LayerRemove { .. } => "layerremove",
            MapEvent::OverlayAdd { .. } => "overlayadd",
            MapEvent::OverlayRemove { .. } => "overlayremove",
            MapEvent::OverlayLoaded { .. } => "overlayloaded",
            MapEvent::OverlayFailed { .. } => "overlayfailed",
            MapEvent::FitStart { .. } => "fitstart",
        }
    }
}
