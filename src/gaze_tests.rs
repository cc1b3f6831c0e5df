#[cfg(test)]
mod tests {
    use crate::gaze::{compute_gaze_target, CursorSmoother, GazeEstimator};
    use crate::types::{LandmarkPoint, ScreenPoint, ScreenSize};

    // =========================================================================
    // Regression Tests: iris -> screen mapping
    // Convention: window low edge maps to pixel 0, high edge to span.
    // =========================================================================

    fn default_estimator() -> GazeEstimator {
        GazeEstimator::new([0.43, 0.57], [0.43, 0.53], 2.5, 2.5)
    }

    #[test]
    fn test_reference_frame_maps_and_smooths() {
        let screen = ScreenSize::new(1920, 1080);
        let target = default_estimator().estimate(&LandmarkPoint::new(0.50, 0.48, 0.0), screen);
        assert!((target.x - 2400.0).abs() < 1e-3, "raw x was {}", target.x);
        assert!((target.y - 1350.0).abs() < 1e-3, "raw y was {}", target.y);

        let mut smoother = CursorSmoother::new(screen, 5, 25);
        assert_eq!(smoother.step(target), ScreenPoint::new(1248, 702));
    }

    #[test]
    fn test_window_edges() {
        let t = compute_gaze_target(0.43, 0.43, [0.43, 0.57], [0.43, 0.53], 4800.0, 2700.0);
        assert!(t.x.abs() < 1e-3);
        assert!(t.y.abs() < 1e-3);

        let t = compute_gaze_target(0.57, 0.53, [0.43, 0.57], [0.43, 0.53], 4800.0, 2700.0);
        assert!((t.x - 4800.0).abs() < 1e-2);
        assert!((t.y - 2700.0).abs() < 1e-2);
    }

    #[test]
    fn test_outside_window_extrapolates() {
        // Looking further left than the window: negative, not clamped.
        let t = compute_gaze_target(0.36, 0.58, [0.43, 0.57], [0.43, 0.53], 4800.0, 2700.0);
        assert!(t.x < -2000.0, "expected extrapolated x, got {}", t.x);
        assert!(t.y > 2700.0, "expected extrapolated y, got {}", t.y);
    }

    #[test]
    fn test_degenerate_window_maps_to_zero() {
        let t = compute_gaze_target(0.6, 0.6, [0.5, 0.5], [0.5, 0.5], 4800.0, 2700.0);
        assert_eq!(t.x, 0.0);
        assert_eq!(t.y, 0.0);
    }

    #[test]
    fn test_sensitivity_scales_span() {
        let screen = ScreenSize::new(1000, 1000);
        let low = GazeEstimator::new([0.43, 0.57], [0.43, 0.53], 1.0, 1.0)
            .estimate(&LandmarkPoint::new(0.57, 0.53, 0.0), screen);
        let high = GazeEstimator::new([0.43, 0.57], [0.43, 0.53], 5.0, 5.0)
            .estimate(&LandmarkPoint::new(0.57, 0.53, 0.0), screen);
        assert!((low.x - 1000.0).abs() < 1e-2);
        assert!((high.x - 5000.0).abs() < 1e-1);
    }
}
