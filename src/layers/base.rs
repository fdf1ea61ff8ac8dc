use crate::core::geo::Extent;

/// What a layer is for. Overlay removal is a query on this tag, never a type probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRole {
    Base,
    Overlay,
}

impl std::fmt::Display for LayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerRole::Base => write!(f, "base"),
            LayerRole::Overlay => write!(f, "overlay"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub role: LayerRole,
    pub z_index: i32,
    pub visible: bool,
}

impl LayerProperties {
    pub fn new(id: String, name: String, role: LayerRole) -> Self {
        Self {
            id,
            name,
            role,
            z_index: 0,
            visible: true,
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }
}

/// Common surface of every layer a [`MapSession`](crate::core::map::MapSession) can hold
pub trait LayerTrait: Send {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn role(&self) -> LayerRole;

    fn z_index(&self) -> i32;

    fn set_z_index(&mut self, z_index: i32);

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Area covered by the layer's data, if known
    fn extent(&self) -> Option<Extent> {
        None
    }

    /// Layer-specific description, for diagnostics and host UIs
    fn options(&self) -> serde_json::Value;

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
