use crate::{
    layers::base::{LayerRole, LayerTrait},
    prelude::HashMap,
    MapError, Result,
};

/// The session's layer collection: the single source of truth for what is displayed
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn LayerTrait>>,
    /// Ordered list of layer IDs for rendering (sorted by z-index)
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Adds a layer to the manager. Layer ids must be unique.
    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Layer(format!("layer '{}' is already attached", layer_id)));
        }
        let z_index = layer.z_index();

        // Insert in sorted order by z-index, after layers with the same z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.layers.insert(layer_id.clone(), layer);
        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    /// Removes a layer from the manager
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.render_order.retain(|id| id != layer_id);
        self.layers.remove(layer_id)
    }

    /// Removes every layer tagged with `role`, returning them in render order
    pub fn remove_by_role(&mut self, role: LayerRole) -> Vec<Box<dyn LayerTrait>> {
        let ids = self.ids_with_role(role);
        ids.iter().filter_map(|id| self.remove_layer(id)).collect()
    }

    /// Ids of the layers tagged with `role`, in render order
    pub fn ids_with_role(&self, role: LayerRole) -> Vec<String> {
        self.render_order
            .iter()
            .filter(|id| self.layers.get(*id).map(|l| l.role() == role).unwrap_or(false))
            .cloned()
            .collect()
    }

    pub fn count_role(&self, role: LayerRole) -> usize {
        self.layers.values().filter(|l| l.role() == role).count()
    }

    /// Gets a reference to a layer by ID
    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    /// Gets a mutable reference to a layer by ID
    pub fn layer_mut(&mut self, layer_id: &str) -> Option<&mut (dyn LayerTrait + 'static)> {
        self.layers.get_mut(layer_id).map(|l| l.as_mut())
    }

    /// Gets all layers in render order
    pub fn layers(&self) -> Vec<&dyn LayerTrait> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id).map(|l| l.as_ref()))
            .collect()
    }

    /// Drops every layer
    pub fn clear(&mut self) {
        self.render_order.clear();
        self.layers.clear();
    }

    /// Gets the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Checks if the manager is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}
