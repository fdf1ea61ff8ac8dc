use crate::{
    core::{constants::OVERLAY_Z_INDEX, geo::Extent},
    layers::base::{LayerProperties, LayerRole, LayerTrait},
    tiles::{
        loader::{LoadState, RequestId},
        wms::WmsSource,
    },
};

/// An in-flight or finished request for one dataset's overlay image
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRequest {
    pub id: RequestId,
    pub dataset_key: String,
    /// Area the image was requested for
    pub requested_extent: Extent,
    pub state: LoadState,
}

impl OverlayRequest {
    pub fn new(id: RequestId, dataset_key: String, requested_extent: Extent) -> Self {
        Self {
            id,
            dataset_key,
            requested_extent,
            state: LoadState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == LoadState::Pending
    }
}

/// Raster overlay backed by a WMS image request
pub struct ImageLayer {
    properties: LayerProperties,
    source: WmsSource,
    request: OverlayRequest,
}

impl ImageLayer {
    pub fn new(source: WmsSource, request: OverlayRequest) -> Self {
        let properties = LayerProperties::new(
            format!("overlay-{}", request.id.0),
            source.layer().to_string(),
            LayerRole::Overlay,
        )
        .with_z_index(OVERLAY_Z_INDEX);
        Self {
            properties,
            source,
            request,
        }
    }

    pub fn source(&self) -> &WmsSource {
        &self.source
    }

    pub fn request(&self) -> &OverlayRequest {
        &self.request
    }

    pub fn request_id(&self) -> RequestId {
        self.request.id
    }

    pub fn dataset_key(&self) -> &str {
        &self.request.dataset_key
    }

    pub fn load_state(&self) -> &LoadState {
        &self.request.state
    }

    pub fn set_load_state(&mut self, state: LoadState) {
        self.request.state = state;
    }
}

impl LayerTrait for ImageLayer {
    crate::impl_layer_trait!(properties);

    /// Known only once the image has loaded
    fn extent(&self) -> Option<Extent> {
        match &self.request.state {
            LoadState::Loaded { extent } => Some(*extent),
            _ => None,
        }
    }

    fn options(&self) -> serde_json::Value {
        let state = match &self.request.state {
            LoadState::Pending => "pending",
            LoadState::Loaded { .. } => "loaded",
            LoadState::Failed { .. } => "failed",
        };
        serde_json::json!({
            "role": self.properties.role.to_string(),
            "dataset": self.request.dataset_key,
            "layer": self.source.layer(),
            "format": self.source.format(),
            "endpoint": self.source.endpoint().as_str(),
            "request": self.request.id.0,
            "state": state,
        })
    }
}
