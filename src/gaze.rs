use crate::config::TrackingConfig;
use crate::types::{LandmarkPoint, ScreenPoint, ScreenSize};

// =========================================================================
// Gaze Estimator
// Iris position inside a narrow calibration window -> raw screen target.
// =========================================================================

/// Raw gaze target in screen pixels. Not clamped, may lie off-screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeTarget {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct GazeEstimator {
    pub window_x: [f32; 2],
    pub window_y: [f32; 2],
    pub sensitivity_x: f32,
    pub sensitivity_y: f32,
}

impl GazeEstimator {
    pub fn new(window_x: [f32; 2], window_y: [f32; 2], sensitivity_x: f32, sensitivity_y: f32) -> Self {
        Self {
            window_x,
            window_y,
            sensitivity_x,
            sensitivity_y,
        }
    }

    pub fn from_config(config: &TrackingConfig) -> Self {
        Self::new(
            config.gaze_window_x,
            config.gaze_window_y,
            config.sensitivity_x,
            config.sensitivity_y,
        )
    }

    pub fn estimate(&self, iris: &LandmarkPoint, screen: ScreenSize) -> GazeTarget {
        compute_gaze_target(
            iris.x,
            iris.y,
            self.window_x,
            self.window_y,
            screen.width as f64 * self.sensitivity_x as f64,
            screen.height as f64 * self.sensitivity_y as f64,
        )
    }
}

/// Pure mapping, kept free-standing for regression tests.
pub fn compute_gaze_target(
    iris_x: f32,
    iris_y: f32,
    window_x: [f32; 2],
    window_y: [f32; 2],
    span_x: f64,
    span_y: f64,
) -> GazeTarget {
    GazeTarget {
        x: remap(iris_x as f64, window_x, span_x),
        y: remap(iris_y as f64, window_y, span_y),
    }
}

/// Linear map of `[lo, hi]` onto `[0, span]`, extrapolating outside.
fn remap(value: f64, window: [f32; 2], span: f64) -> f64 {
    let lo = window[0] as f64;
    let hi = window[1] as f64;
    let width = hi - lo;
    if width == 0.0 {
        return 0.0;
    }
    (value - lo) / width * span
}

// =========================================================================
// Cursor Smoother
// Single-pole IIR: new = prev + (target - prev) / N, then edge clamp.
// =========================================================================

#[derive(Debug, Clone)]
pub struct CursorSmoother {
    current: ScreenPoint,
    smoothing: u32,
    edge_margin: i32,
    screen: ScreenSize,
}

impl CursorSmoother {
    /// Starts at screen centre. `smoothing` of 0 is treated as 1.
    pub fn new(screen: ScreenSize, smoothing: u32, edge_margin: i32) -> Self {
        let mut smoother = Self {
            current: screen.center(),
            smoothing: smoothing.max(1),
            edge_margin,
            screen,
        };
        smoother.current = smoother.clamp(smoother.current);
        smoother
    }

    pub fn current(&self) -> ScreenPoint {
        self.current
    }

    pub fn smoothing(&self) -> u32 {
        self.smoothing
    }

    pub fn set_smoothing(&mut self, smoothing: u32) {
        self.smoothing = smoothing.max(1);
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Advances one frame toward `target` and returns the new position.
    pub fn step(&mut self, target: GazeTarget) -> ScreenPoint {
        let n = self.smoothing as f64;
        let prev_x = self.current.x as f64;
        let prev_y = self.current.y as f64;

        // Nearest pixel, so float noise around a whole pixel can't drop a
        // coordinate by one. `as` saturates and maps NaN to 0.
        let next = ScreenPoint::new(
            (prev_x + (target.x - prev_x) / n).round() as i32,
            (prev_y + (target.y - prev_y) / n).round() as i32,
        );

        self.current = self.clamp(next);
        self.current
    }

    fn clamp(&self, p: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new(
            clamp_axis(p.x, self.edge_margin, self.screen.width),
            clamp_axis(p.y, self.edge_margin, self.screen.height),
        )
    }
}

/// `max(margin, min(dim - margin, v))`; collapses to `margin` on tiny screens.
fn clamp_axis(value: i32, margin: i32, dimension: i32) -> i32 {
    value.min(dimension - margin).max(margin)
}
