use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Web Mercator projection constants
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half the width of the EPSG:3857 world square, in metres.
pub const HALF_WORLD: f64 = PI * EARTH_RADIUS;

/// Represents a point in projected map coordinates or screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation towards `other`; `t` is not clamped.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        self.add(&other.subtract(self).multiply(t))
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Bounding rectangle in map coordinates, `[min_x, min_y, max_x, max_y]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// The full EPSG:3857 square
    pub fn world() -> Self {
        Self::new(-HALF_WORLD, -HALF_WORLD, HALF_WORLD, HALF_WORLD)
    }

    /// Builds the extent of a `size` pixel window centred on `center`
    pub fn from_center(center: Point, resolution: f64, size: Point) -> Self {
        let half_w = size.x * resolution / 2.0;
        let half_h = size.y * resolution / 2.0;
        Self::new(
            center.x - half_w,
            center.y - half_h,
            center.x + half_w,
            center.y + half_h,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Gets the center point of the extent
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Finite and not inverted. A zero-area extent is still valid.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Checks if the extent contains a point
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Checks if the extent intersects with another extent
    pub fn intersects(&self, other: &Extent) -> bool {
        !(other.max_x < self.min_x
            || other.min_x > self.max_x
            || other.max_y < self.min_y
            || other.min_y > self.max_y)
    }

    /// Returns the overlap with `other`, if any
    pub fn intersection(&self, other: &Extent) -> Option<Extent> {
        if !self.intersects(other) {
            return None;
        }
        Some(Extent::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        ))
    }

    /// Comma separated `minx,miny,maxx,maxy`, the WMS `BBOX` form
    pub fn to_bbox_param(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

impl From<[f64; 4]> for Extent {
    fn from([min_x, min_y, max_x, max_y]: [f64; 4]) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Tile containing a projected point at the given zoom level
    pub fn from_point(point: &Point, zoom: u8) -> Self {
        let n = 2_f64.powi(zoom as i32);
        let max = (n as u32).saturating_sub(1);
        let fx = (point.x + HALF_WORLD) / (2.0 * HALF_WORLD) * n;
        let fy = (HALF_WORLD - point.y) / (2.0 * HALF_WORLD) * n;
        let x = (fx.floor().max(0.0) as u32).min(max);
        let y = (fy.floor().max(0.0) as u32).min(max);
        Self::new(x, y, zoom)
    }

    /// Gets the extent of the tile in map coordinates
    pub fn extent(&self) -> Extent {
        let n = 2_f64.powi(self.z as i32);
        let span = 2.0 * HALF_WORLD / n;
        let min_x = -HALF_WORLD + self.x as f64 * span;
        let max_y = HALF_WORLD - self.y as f64 * span;
        Extent::new(min_x, max_y - span, min_x + span, max_y)
    }

    /// Checks if the tile is valid for the given zoom level
    pub fn is_valid(&self) -> bool {
        // Beyond z = 63 every u32 index is in range
        let Some(max_coord) = 1_u64.checked_shl(self.z as u32) else {
            return true;
        };
        (self.x as u64) < max_coord && (self.y as u64) < max_coord
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_center_and_size() {
        let extent = Extent::from([0.0, 0.0, 10.0, 20.0]);
        assert_eq!(extent.center(), Point::new(5.0, 10.0));
        assert_eq!(extent.width(), 10.0);
        assert_eq!(extent.height(), 20.0);
        assert!(extent.is_valid());
        assert!(!extent.is_empty());
    }

    #[test]
    fn test_extent_validity() {
        assert!(!Extent::new(10.0, 0.0, 0.0, 10.0).is_valid());
        assert!(!Extent::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
        assert!(Extent::new(1.0, 1.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_extent_intersection() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        let b = Extent::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!(a.intersection(&b), Some(Extent::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(a.intersection(&Extent::new(20.0, 20.0, 30.0, 30.0)), None);
    }

    #[test]
    fn test_bbox_param() {
        let extent = Extent::new(-1.5, 0.0, 2.0, 3.25);
        assert_eq!(extent.to_bbox_param(), "-1.5,0,2,3.25");
    }

    #[test]
    fn test_tile_coord_round_trip() {
        let tile = TileCoord::new(3, 5, 4);
        let center = tile.extent().center();
        assert_eq!(TileCoord::from_point(&center, 4), tile);
        assert!(tile.is_valid());
        assert!(!TileCoord::new(16, 0, 4).is_valid());
    }

    #[test]
    fn test_validity_at_extreme_zoom() {
        assert!(TileCoord::new(u32::MAX, u32::MAX, 64).is_valid());
        assert!(TileCoord::new(u32::MAX, 0, 255).is_valid());
        assert!(TileCoord::new(3, 3, 2).is_valid());
        assert!(!TileCoord::new(4, 0, 2).is_valid());
    }

    #[test]
    fn test_world_tile() {
        let tile = TileCoord::new(0, 0, 0);
        assert_eq!(tile.extent(), Extent::world());
        assert_eq!(TileCoord::from_point(&Point::default(), 0), tile);
    }
}
