use crate::animation::{EasingType, ViewTransition};
use crate::core::constants::{DEFAULT_FIT_DURATION_MS, TILE_SIZE};
use crate::core::geo::{Extent, Point, HALF_WORLD};
use instant::Instant;
use std::time::Duration;

/// Resolution (map units per pixel) at zoom 0.
pub fn max_resolution() -> f64 {
    2.0 * HALF_WORLD / TILE_SIZE as f64
}

/// Options for [`View::fit`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub duration: Duration,
    /// Pixels kept free on every side of the fitted extent
    pub padding: f64,
    pub easing: EasingType,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(DEFAULT_FIT_DURATION_MS),
            padding: 0.0,
            easing: EasingType::EaseOut,
        }
    }
}

/// The current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone)]
pub struct View {
    /// The center of the map view in projected coordinates
    pub center: Point,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    transition: Option<ViewTransition>,
}

impl View {
    pub fn new(center: Point, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom,
            size,
            min_zoom: 0.0,
            max_zoom: 28.0,
            transition: None,
        }
    }

    /// Sets the center, cancelling any running transition
    pub fn set_center(&mut self, center: Point) {
        self.transition = None;
        self.center = center;
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.transition = None;
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits. Inverted or NaN limits are ignored.
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        if !(min_zoom <= max_zoom) {
            log::warn!("ignoring zoom limits {}..{}", min_zoom, max_zoom);
            return;
        }
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// Map units per pixel at the current zoom
    pub fn resolution(&self) -> f64 {
        max_resolution() / 2_f64.powf(self.zoom)
    }

    /// The area currently visible in the viewport
    pub fn extent(&self) -> Extent {
        Extent::from_center(self.center, self.resolution(), self.size)
    }

    /// Center and zoom that frame `extent` inside the viewport.
    ///
    /// Returns `None` for an invalid extent or a viewport with no usable area.
    /// A degenerate extent (a single point) resolves to the maximum zoom.
    pub fn fit_target(&self, extent: &Extent, padding: f64) -> Option<(Point, f64)> {
        if !extent.is_valid() {
            return None;
        }
        let avail_w = self.size.x - 2.0 * padding;
        let avail_h = self.size.y - 2.0 * padding;
        if avail_w <= 0.0 || avail_h <= 0.0 {
            return None;
        }

        let resolution = (extent.width() / avail_w).max(extent.height() / avail_h);
        let zoom = if resolution > 0.0 {
            (max_resolution() / resolution).log2()
        } else {
            self.max_zoom
        };

        Some((extent.center(), zoom.clamp(self.min_zoom, self.max_zoom)))
    }

    /// Starts an animated transition that frames `extent`.
    ///
    /// Replaces any transition already running. A zero duration applies the
    /// target immediately. Returns `false` if the extent cannot be fitted.
    pub fn fit(&mut self, extent: &Extent, options: FitOptions, now: Instant) -> bool {
        let Some((center, zoom)) = self.fit_target(extent, options.padding) else {
            return false;
        };

        if options.duration.is_zero() {
            self.transition = None;
            self.center = center;
            self.zoom = zoom;
            return true;
        }

        self.transition = Some(ViewTransition::new(
            (self.center, self.zoom),
            (center, zoom),
            now,
            options.duration,
            options.easing,
        ));
        true
    }

    /// Advances a running transition to `now`. Returns whether the view moved.
    pub fn update(&mut self, now: Instant) -> bool {
        let Some(transition) = &self.transition else {
            return false;
        };

        let frame = transition.sample(now);
        let moved = frame.center != self.center || frame.zoom != self.zoom;
        self.center = frame.center;
        self.zoom = frame.zoom;
        if frame.finished {
            self.transition = None;
        }
        moved
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn cancel_animation(&mut self) {
        self.transition = None;
    }

    /// Where the view will settle: the transition target, or the current state
    pub fn target(&self) -> (Point, f64) {
        self.transition
            .as_ref()
            .map(ViewTransition::target)
            .unwrap_or((self.center, self.zoom))
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new(Point::default(), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_view_resolution() {
        let view = View::new(Point::default(), 0.0, Point::new(256.0, 256.0));
        let extent = view.extent();
        assert!((extent.width() - 2.0 * HALF_WORLD).abs() < 1e-6);
        assert!((extent.center().x).abs() < 1e-9);
    }

    #[test]
    fn test_fit_target_centers_extent() {
        let view = View::new(Point::default(), 0.0, Point::new(800.0, 600.0));
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        let (center, zoom) = view.fit_target(&extent, 0.0).unwrap();
        assert_eq!(center, Point::new(5.0, 5.0));

        // 10 units over 600 px is the limiting axis.
        let expected = (max_resolution() / (10.0 / 600.0)).log2();
        assert!((zoom - expected).abs() < 1e-9);
    }

    #[test]
    fn test_fit_target_clamps_zoom() {
        let mut view = View::default();
        view.set_zoom_limits(0.0, 18.0);
        let (_, zoom) = view.fit_target(&Extent::new(0.0, 0.0, 10.0, 10.0), 0.0).unwrap();
        assert_eq!(zoom, 18.0);

        let (_, zoom) = view.fit_target(&Extent::new(5.0, 5.0, 5.0, 5.0), 0.0).unwrap();
        assert_eq!(zoom, 18.0);
    }

    #[test]
    fn test_fit_target_rejects_invalid() {
        let view = View::default();
        assert!(view.fit_target(&Extent::new(1.0, 0.0, 0.0, 1.0), 0.0).is_none());
        assert!(view.fit_target(&Extent::world(), 500.0).is_none());
    }

    #[test]
    fn test_fit_animates_to_target() {
        let mut view = View::default();
        let start = Instant::now();
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        assert!(view.fit(&extent, FitOptions::default(), start));
        assert!(view.is_animating());
        assert_eq!(view.center, Point::default());

        let (target_center, target_zoom) = view.target();
        assert_eq!(target_center, Point::new(5.0, 5.0));

        assert!(view.update(start + Duration::from_millis(400)));
        assert!(view.is_animating());
        assert!(view.zoom > 0.0 && view.zoom < target_zoom);

        view.update(start + Duration::from_millis(1000));
        assert!(!view.is_animating());
        assert_eq!(view.center, target_center);
        assert_eq!(view.zoom, target_zoom);
    }

    #[test]
    fn test_zero_duration_fit_is_immediate() {
        let mut view = View::default();
        let options = FitOptions {
            duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(view.fit(&Extent::new(0.0, 0.0, 10.0, 10.0), options, Instant::now()));
        assert!(!view.is_animating());
        assert_eq!(view.center, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_set_zoom_cancels_transition() {
        let mut view = View::default();
        view.fit(&Extent::new(0.0, 0.0, 10.0, 10.0), FitOptions::default(), Instant::now());
        view.set_zoom(3.0);
        assert!(!view.is_animating());
        assert_eq!(view.zoom, 3.0);
    }

    #[test]
    fn test_invalid_zoom_limits_are_ignored() {
        let mut view = View::new(Point::default(), 4.0, Point::new(800.0, 600.0));
        view.set_zoom_limits(5.0, 2.0);
        view.set_zoom_limits(f64::NAN, 28.0);
        assert_eq!((view.min_zoom, view.max_zoom), (0.0, 28.0));
        assert_eq!(view.zoom, 4.0);

        view.set_zoom_limits(1.0, 3.0);
        assert_eq!(view.zoom, 3.0);
    }
}
