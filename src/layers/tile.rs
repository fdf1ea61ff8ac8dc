use crate::{
    core::{
        geo::{Extent, Point, TileCoord},
        view::View,
    },
    layers::base::{LayerProperties, LayerRole, LayerTrait},
    tiles::source::{TileSource, XyzSource},
    Result,
};

/// The always-present background layer, drawn from an XYZ tile server
pub struct TileLayer {
    properties: LayerProperties,
    source: Box<dyn TileSource>,
}

impl TileLayer {
    pub fn new(id: String, name: String, source: Box<dyn TileSource>) -> Self {
        let properties = LayerProperties::new(id, name, LayerRole::Base);
        Self { properties, source }
    }

    /// Base layer from a `{z}/{x}/{y}` template
    pub fn from_template(id: String, name: String, template: &str, max_zoom: u8) -> Result<Self> {
        let source = XyzSource::new(template, max_zoom)?;
        Ok(Self::new(id, name, Box::new(source)))
    }

    pub fn source(&self) -> &dyn TileSource {
        self.source.as_ref()
    }

    /// Integer tile zoom used to draw `view`
    pub fn tile_zoom(&self, view: &View) -> u8 {
        let zoom = view.zoom.floor().max(0.0) as u8;
        zoom.min(self.source.max_zoom())
    }

    /// Tiles covering the visible part of `view`
    pub fn visible_tiles(&self, view: &View) -> Vec<TileCoord> {
        let zoom = self.tile_zoom(view);
        let Some(visible) = view.extent().intersection(&Extent::world()) else {
            return Vec::new();
        };

        let top_left = TileCoord::from_point(&Point::new(visible.min_x, visible.max_y), zoom);
        let bottom_right = TileCoord::from_point(&Point::new(visible.max_x, visible.min_y), zoom);

        let mut tiles = Vec::new();
        for x in top_left.x..=bottom_right.x {
            for y in top_left.y..=bottom_right.y {
                tiles.push(TileCoord::new(x, y, zoom));
            }
        }
        tiles
    }

    /// URLs for the tiles covering `view`
    pub fn visible_tile_urls(&self, view: &View) -> Vec<String> {
        self.visible_tiles(view)
            .into_iter()
            .map(|coord| self.source.url(coord))
            .collect()
    }
}

impl LayerTrait for TileLayer {
    crate::impl_layer_trait!(properties);

    fn extent(&self) -> Option<Extent> {
        Some(Extent::world())
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "role": self.properties.role.to_string(),
            "max_zoom": self.source.max_zoom(),
            "sample_url": self.source.url(TileCoord::new(0, 0, 0)),
        })
    }
}
