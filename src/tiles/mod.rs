pub mod loader;
pub mod source;
pub mod wms;

// Re-exports for convenience
pub use loader::{HttpOverlayLoader, LoadEvent, LoadNotifier, LoadState, ManualLoader, OverlayLoader, RequestId};
pub use source::{TileSource, XyzSource};
pub use wms::{ServerType, WmsSource};
