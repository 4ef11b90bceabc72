//! Time ranges and the active-window predicate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A time span within a video, in floating-point seconds from its start.
///
/// Invariant: `end >= start` for all durable records. A range with
/// `end == start` is a "point event" — an instantaneous observation whose
/// nominal extent is unknown (sparse OCR sampling produces these).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimeRange {
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds. Equal to `start` for point events.
    pub end: f64,
}

impl TimeRange {
    /// Create a new time range.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Create a point event at the given offset.
    pub fn point(at: f64) -> Self {
        Self { start: at, end: at }
    }

    /// True if this range is a point event (`end == start`).
    pub fn is_point(&self) -> bool {
        self.end == self.start
    }

    /// Duration in seconds. Zero for point events.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the range is active at playback offset `t`.
    ///
    /// Ranged events are active on the closed interval `[start, end]`.
    /// Point events are active for every `t >= start` — they never expire
    /// through this predicate alone. A stale point-in-time OCR reading can
    /// therefore still be "active" long after it appeared; selection order
    /// elsewhere is what keeps newer readings winning. Do not tighten this
    /// without a product decision.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && (t <= self.end || self.is_point())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranged_event_active_inside_window() {
        let range = TimeRange::new(10.0, 20.0);
        assert!(range.contains(10.0));
        assert!(range.contains(15.0));
        assert!(range.contains(20.0));
    }

    #[test]
    fn test_ranged_event_inactive_outside_window() {
        let range = TimeRange::new(10.0, 20.0);
        assert!(!range.contains(9.999));
        assert!(!range.contains(20.001));
        assert!(!range.contains(0.0));
    }

    #[test]
    fn test_point_event_active_forever_after_start() {
        // A point event never falls out of scope once its timestamp passes.
        let point = TimeRange::point(5.0);
        assert!(point.contains(5.0));
        assert!(point.contains(5.1));
        assert!(point.contains(3600.0));
        assert!(!point.contains(4.999));
    }

    #[test]
    fn test_point_event_detection() {
        assert!(TimeRange::point(7.5).is_point());
        assert!(TimeRange::new(7.5, 7.5).is_point());
        assert!(!TimeRange::new(7.5, 8.0).is_point());
    }

    #[test]
    fn test_duration() {
        assert_eq!(TimeRange::new(2.0, 6.5).duration(), 4.5);
        assert_eq!(TimeRange::point(3.0).duration(), 0.0);
    }
}
