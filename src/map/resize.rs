use std::time::{Duration, Instant};

use crate::map::config::MOBILE_BREAKPOINT;

/// How often a burst of resize events may trigger a render.
pub const RESIZE_THROTTLE: Duration = Duration::from_millis(250);

/// Trailing-edge-preserving throttle. Calls inside the interval are
/// suppressed but remembered, so the last resize in a burst still
/// produces a render once the window closes; a plain leading-edge
/// throttle would leave the layout visibly stale.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_fire: Option<Instant>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fire: None,
            pending: false,
        }
    }

    /// Record an event. Returns true when the caller should run now.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.last_fire {
            Some(last) if now.duration_since(last) < self.interval => {
                self.pending = true;
                false
            }
            _ => {
                self.last_fire = Some(now);
                self.pending = false;
                true
            }
        }
    }

    /// Trailing edge: true exactly once after a suppressed event's
    /// window has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let window_closed = self
            .last_fire
            .map_or(true, |last| now.duration_since(last) >= self.interval);
        if self.pending && window_closed {
            self.pending = false;
            self.last_fire = Some(now);
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> bool {
        self.pending
    }
}

/// Watches the container width and decides when a full re-render is due.
/// Owns the only mutable state in the pipeline: the current width and
/// the derived mobile flag.
#[derive(Debug, Clone)]
pub struct ResizeCoordinator {
    breakpoint: f64,
    throttle: Throttle,
    width: f64,
    mobile: bool,
    initial: bool,
}

impl ResizeCoordinator {
    pub fn new() -> Self {
        Self {
            breakpoint: MOBILE_BREAKPOINT,
            throttle: Throttle::new(RESIZE_THROTTLE),
            width: 0.0,
            mobile: false,
            initial: true,
        }
    }

    /// Feed the current container width. Returns the width to re-render
    /// at, or `None` when nothing changed or the throttle suppressed the
    /// event for now.
    pub fn observe(&mut self, width: f64, now: Instant) -> Option<f64> {
        let changed = self.initial || (width - self.width).abs() > f64::EPSILON;
        if changed {
            self.width = width;
        }

        if changed && self.throttle.fire(now) {
            self.initial = false;
            self.mobile = self.width <= self.breakpoint;
            return Some(self.width);
        }

        if self.throttle.poll(now) {
            self.mobile = self.width <= self.breakpoint;
            return Some(self.width);
        }

        None
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    /// A suppressed resize is waiting for the throttle window to close.
    pub fn render_pending(&self) -> bool {
        self.throttle.pending()
    }
}

impl Default for ResizeCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    #[test]
    fn first_observation_renders_immediately() {
        let mut coordinator = ResizeCoordinator::new();
        assert_eq!(coordinator.observe(800.0, t0()), Some(800.0));
    }

    #[test]
    fn burst_within_one_interval_renders_at_most_once() {
        let start = t0();
        let mut coordinator = ResizeCoordinator::new();
        assert!(coordinator.observe(800.0, start).is_some());

        let mut renders = 0;
        for i in 1..=10 {
            let now = start + Duration::from_millis(i * 20);
            if coordinator.observe(800.0 + i as f64, now).is_some() {
                renders += 1;
            }
        }
        assert_eq!(renders, 0);
        assert!(coordinator.render_pending());
    }

    #[test]
    fn trailing_resize_fires_with_the_latest_width() {
        let start = t0();
        let mut coordinator = ResizeCoordinator::new();
        assert!(coordinator.observe(800.0, start).is_some());
        assert!(coordinator
            .observe(640.0, start + Duration::from_millis(50))
            .is_none());
        assert!(coordinator
            .observe(500.0, start + Duration::from_millis(100))
            .is_none());

        // Window closes; the last observed width wins.
        let fired = coordinator.observe(500.0, start + Duration::from_millis(300));
        assert_eq!(fired, Some(500.0));
        assert!(coordinator.is_mobile());
    }

    #[test]
    fn breakpoint_classifies_mobile() {
        let start = t0();
        let mut coordinator = ResizeCoordinator::new();
        coordinator.observe(500.0, start);
        assert!(coordinator.is_mobile());
        coordinator.observe(800.0, start + Duration::from_millis(400));
        assert!(!coordinator.is_mobile());
    }

    #[test]
    fn breakpoint_is_inclusive() {
        let mut coordinator = ResizeCoordinator::new();
        coordinator.observe(600.0, t0());
        assert!(coordinator.is_mobile());
    }

    #[test]
    fn unchanged_width_does_not_rerender() {
        let start = t0();
        let mut coordinator = ResizeCoordinator::new();
        assert!(coordinator.observe(800.0, start).is_some());
        assert!(coordinator
            .observe(800.0, start + Duration::from_millis(400))
            .is_none());
    }
}
