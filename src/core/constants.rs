//! Engine-wide defaults for the base map, the overlay service and the view.
//! Keeping them in a single place makes it easier to tweak magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Deepest tile zoom a base layer may advertise.
pub const MAX_TILE_ZOOM: u8 = 30;

/// Base layer tile template; `{a-c}` expands to one subdomain per tile.
pub const DEFAULT_BASE_URL_TEMPLATE: &str = "https://{a-c}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Highest zoom the base tile server publishes.
pub const DEFAULT_BASE_MAX_ZOOM: u8 = 19;

/// WMS endpoint serving the flood rasters.
pub const DEFAULT_OVERLAY_URL: &str = "http://143.110.254.173/geoserver/wms";

/// Image format requested from the overlay service.
pub const DEFAULT_OVERLAY_FORMAT: &str = "image/png";

/// Server-type hint sent along with overlay requests.
pub const DEFAULT_SERVER_TYPE: &str = "geoserver";

pub const DEFAULT_WMS_VERSION: &str = "1.3.0";

pub const DEFAULT_CRS: &str = "EPSG:3857";

/// Workspace prefix of the catalog's overlay identifiers.
pub const DATASET_WORKSPACE: &str = "Flood";

/// Initial view: world view, zoom 0.
pub const DEFAULT_CENTER: [f64; 2] = [0.0, 0.0];
pub const DEFAULT_ZOOM: f64 = 0.0;
pub const DEFAULT_MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_MAX_ZOOM: f64 = 28.0;

/// Viewport size used when the target reports no usable size.
pub const DEFAULT_VIEWPORT_SIZE: [f64; 2] = [800.0, 600.0];

/// Duration of the fit-to-overlay view transition.
pub const DEFAULT_FIT_DURATION_MS: u64 = 1000;

/// z-index the overlay is drawn at; the base layer sits at 0.
pub const OVERLAY_Z_INDEX: i32 = 10;

/// User agent for overlay requests.
/// Largest overlay response body the HTTP loader will read.
pub const MAX_OVERLAY_BYTES: u64 = 32 * 1024 * 1024;

pub const USER_AGENT: &str = concat!("floodmap/", env!("CARGO_PKG_VERSION"));
