pub mod base;
pub mod image;
pub mod macros;
pub mod manager;
pub mod tile;

pub use base::{LayerProperties, LayerRole, LayerTrait};
pub use image::{ImageLayer, OverlayRequest};
pub use manager::LayerManager;
pub use tile::TileLayer;
