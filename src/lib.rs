//! # floodmap
//!
//! Lifecycle management for an interactive 2D map: one base tile layer plus
//! at most one WMS overlay picked from a catalog of named datasets.
//!
//! The [`MapLifecycleManager`] owns the single [`MapSession`], swaps the
//! overlay when the user picks another dataset, and fits the view to the
//! overlay's extent once its image has loaded. Late completions from
//! superseded selections are ignored.

pub mod animation;
pub mod catalog;
pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use catalog::{DatasetCatalog, DatasetEntry, StaticCatalog};

pub use crate::core::{
    builder::MapBuilder,
    config::MapConfig,
    geo::{Extent, Point, TileCoord},
    lifecycle::{MapLifecycleManager, OverlayOutcome},
    map::{MapSession, MapTarget},
    view::View,
};

pub use layers::{
    base::{LayerRole, LayerTrait},
    image::ImageLayer,
    manager::LayerManager,
    tile::TileLayer,
};

pub use input::{events::MapEvent, handler::EventManager};

pub use tiles::loader::{HttpOverlayLoader, LoadEvent, LoadState, OverlayLoader, RequestId};

/// Result type used throughout the library
pub type Result<T, E = MapError> = std::result::Result<T, E>;

/// Reasons a session could not be created on a target
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitializationError {
    #[error("no rendering target was supplied")]
    MissingTarget,

    #[error("rendering target '{target}' already hosts a map")]
    TargetAlreadyBound { target: String },

    #[error("a map session is already initialized")]
    AlreadyInitialized,
}

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("initialization failed: {0}")]
    Initialization(#[from] InitializationError),

    #[error("map is not initialized")]
    NotInitialized,

    #[error("unknown dataset '{key}'")]
    UnknownDataset { key: String },

    #[error("overlay construction failed: {0}")]
    OverlayConstruction(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` as the `log` backend. Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
