//! Auto-zoom: zoom in when a QR code reads but fills little of the frame.

use crate::models::{DecodeResult, Point};
use std::time::{Duration, Instant};

/// What the session should do with a successful read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDecision {
    /// Deliver the result, no camera action
    Finalize,
    /// Request one zoom step, then deliver the result anyway
    ZoomAndFinalize,
}

/// Largest distance among the first three points, floored to whole pixels.
///
/// With two points this is their distance; fewer than two gives `None`.
pub fn finder_span(points: &[Point]) -> Option<u32> {
    let span = match points {
        [] | [_] => return None,
        [a, b] => a.distance(b),
        [a, b, c, ..] => a.distance(b).max(b.distance(c)).max(a.distance(c)),
    };
    Some(span.floor() as u32)
}

/// Rate-limited small-code detector
#[derive(Debug, Clone)]
pub struct AutoZoom {
    enabled: bool,
    cooldown: Duration,
    last_zoom: Option<Instant>,
}

impl AutoZoom {
    /// Controller with the given cooldown between zoom actions
    pub fn new(enabled: bool, cooldown: Duration) -> Self {
        Self {
            enabled,
            cooldown,
            last_zoom: None,
        }
    }

    /// When the last zoom was requested
    pub fn last_zoom(&self) -> Option<Instant> {
        self.last_zoom
    }

    /// Forget the last zoom time (new session)
    pub fn reset(&mut self) {
        self.last_zoom = None;
    }

    fn cooled_down(&self, now: Instant) -> bool {
        self.last_zoom
            .is_none_or(|last| now.saturating_duration_since(last) > self.cooldown)
    }

    /// Decide on `result` read from a `width` x `height` frame at `now`.
    ///
    /// Records `now` as the last zoom time when a zoom is requested.
    pub fn evaluate(
        &mut self,
        result: &DecodeResult,
        width: usize,
        height: usize,
        now: Instant,
    ) -> ZoomDecision {
        if !self.enabled || !result.symbology().is_two_dimensional() || !self.cooled_down(now) {
            return ZoomDecision::Finalize;
        }
        let Some(span) = finder_span(result.points()) else {
            return ZoomDecision::Finalize;
        };

        if (span as u64) * 4 < width.min(height) as u64 {
            self.last_zoom = Some(now);
            ZoomDecision::ZoomAndFinalize
        } else {
            ZoomDecision::Finalize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Symbology;

    fn qr(side: f32) -> DecodeResult {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(side, 0.0),
            Point::new(side, side),
            Point::new(0.0, side),
        ];
        DecodeResult::new("x", Symbology::QrCode, points)
    }

    fn controller() -> AutoZoom {
        AutoZoom::new(true, Duration::from_millis(100))
    }

    #[test]
    fn test_finder_span() {
        assert_eq!(finder_span(&[]), None);
        assert_eq!(finder_span(&[Point::new(0.0, 0.0)]), None);
        assert_eq!(finder_span(&[Point::new(0.0, 0.0), Point::new(3.0, 4.0)]), Some(5));
        // Diagonal of the first three points
        assert_eq!(finder_span(qr(100.0).points()), Some(141));
    }

    #[test]
    fn test_small_code_zooms_and_records_time() {
        let mut zoom = controller();
        let now = Instant::now();
        // span 141 * 4 = 564 < 600
        assert_eq!(zoom.evaluate(&qr(100.0), 800, 600, now), ZoomDecision::ZoomAndFinalize);
        assert_eq!(zoom.last_zoom(), Some(now));
    }

    #[test]
    fn test_large_code_finalizes() {
        let mut zoom = controller();
        // span 212 * 4 = 848 >= 600
        assert_eq!(zoom.evaluate(&qr(150.0), 800, 600, Instant::now()), ZoomDecision::Finalize);
        assert_eq!(zoom.last_zoom(), None);
    }

    #[test]
    fn test_cooldown() {
        let mut zoom = controller();
        let t0 = Instant::now();
        assert_eq!(zoom.evaluate(&qr(10.0), 800, 600, t0), ZoomDecision::ZoomAndFinalize);
        let t1 = t0 + Duration::from_millis(50);
        assert_eq!(zoom.evaluate(&qr(10.0), 800, 600, t1), ZoomDecision::Finalize);
        let t2 = t0 + Duration::from_millis(100);
        assert_eq!(zoom.evaluate(&qr(10.0), 800, 600, t2), ZoomDecision::Finalize);
        let t3 = t0 + Duration::from_millis(101);
        assert_eq!(zoom.evaluate(&qr(10.0), 800, 600, t3), ZoomDecision::ZoomAndFinalize);
        assert_eq!(zoom.last_zoom(), Some(t3));
    }

    #[test]
    fn test_linear_codes_and_disabled_controller_never_zoom() {
        let mut zoom = controller();
        let ean = DecodeResult::new(
            "4006381333931",
            Symbology::Ean13,
            vec![Point::new(0.0, 5.0), Point::new(20.0, 5.0)],
        );
        assert_eq!(zoom.evaluate(&ean, 800, 600, Instant::now()), ZoomDecision::Finalize);

        let mut off = AutoZoom::new(false, Duration::from_millis(100));
        assert_eq!(off.evaluate(&qr(10.0), 800, 600, Instant::now()), ZoomDecision::Finalize);
    }

    #[test]
    fn test_missing_geometry_finalizes() {
        let mut zoom = controller();
        let bare = DecodeResult::new("x", Symbology::QrCode, Vec::new());
        assert_eq!(zoom.evaluate(&bare, 800, 600, Instant::now()), ZoomDecision::Finalize);
    }
}
