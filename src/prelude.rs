//! Prelude module for common floodmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use floodmap::prelude::*;`

pub use crate::core::{
    builder::MapBuilder,
    config::{BaseLayerConfig, MapConfig, OverlayServiceConfig, ViewConfig},
    geo::{Extent, Point, TileCoord},
    lifecycle::{MapLifecycleManager, OverlayOutcome},
    map::{MapSession, MapTarget},
    view::{FitOptions, View},
};

pub use crate::catalog::{DatasetCatalog, DatasetEntry, StaticCatalog};

pub use crate::layers::{
    base::{LayerProperties, LayerRole, LayerTrait},
    image::ImageLayer,
    manager::LayerManager,
    tile::TileLayer,
};

pub use crate::input::{events::MapEvent, handler::EventManager};

pub use crate::tiles::{
    loader::{HttpOverlayLoader, LoadEvent, LoadNotifier, LoadState, OverlayLoader, RequestId},
    source::{TileSource, XyzSource},
    wms::WmsSource,
};

pub use crate::animation::easing::EasingType;

pub use crate::{Error as MapError, InitializationError, Result};

pub use std::{sync::Arc, time::Duration};

pub use instant::Instant;

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
