use crate::animation::easing::EasingType;
use crate::core::geo::Point;
use instant::Instant;
use std::time::Duration;

/// Interpolated view state at one instant of a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionFrame {
    pub center: Point,
    pub zoom: f64,
    /// Eased progress in `[0, 1]`
    pub progress: f64,
    pub finished: bool,
}

/// Time-based center/zoom animation driven by the host's frame clock
#[derive(Debug, Clone)]
pub struct ViewTransition {
    start_time: Instant,
    duration: Duration,
    easing: EasingType,
    from_center: Point,
    to_center: Point,
    from_zoom: f64,
    to_zoom: f64,
}

impl ViewTransition {
    pub fn new(
        from: (Point, f64),
        to: (Point, f64),
        start_time: Instant,
        duration: Duration,
        easing: EasingType,
    ) -> Self {
        Self {
            start_time,
            duration,
            easing,
            from_center: from.0,
            to_center: to.0,
            from_zoom: from.1,
            to_zoom: to.1,
        }
    }

    pub fn target(&self) -> (Point, f64) {
        (self.to_center, self.to_zoom)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Samples the transition at `now`. A zero duration finishes immediately.
    pub fn sample(&self, now: Instant) -> TransitionFrame {
        let elapsed = now.saturating_duration_since(self.start_time);
        if elapsed >= self.duration {
            return TransitionFrame {
                center: self.to_center,
                zoom: self.to_zoom,
                progress: 1.0,
                finished: true,
            };
        }

        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = self.easing.apply(progress);
        TransitionFrame {
            center: self.from_center.lerp(&self.to_center, eased),
            zoom: self.from_zoom + (self.to_zoom - self.from_zoom) * eased,
            progress: eased,
            finished: false,
        }
    }
}
