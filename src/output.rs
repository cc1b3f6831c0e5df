use anyhow::Result;
use image::{Rgb, RgbImage};
use log::info;

use crate::blink::EyeContour;
use crate::camera::Frame;
use crate::config::{parse_hex, AppConfig};
use crate::font;
use crate::session::{FrameReport, UserInput};
use crate::types::{Detection, LandmarkPoint};

/// Receives every processed frame. Returns any user requests (toggles,
/// stop) collected since the previous frame.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame, detection: &Detection, report: &FrameReport) -> Result<Vec<UserInput>>;
}

const TEXT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TEXT_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const IRIS_COLOR: Rgb<u8> = Rgb([255, 64, 64]);

/// How landmarks and status text are drawn onto a frame.
#[derive(Debug, Clone)]
pub struct AnnotationStyle {
    pub show_landmarks: bool,
    pub landmark_color: Rgb<u8>,
    pub text_scale: u32,
    pub iris_index: usize,
    pub contour: EyeContour,
}

impl AnnotationStyle {
    pub fn from_config(config: &AppConfig) -> Self {
        let (r, g, b) = parse_hex(&config.ui.landmark_color_hex);
        Self {
            show_landmarks: config.ui.show_landmarks,
            landmark_color: Rgb([r, g, b]),
            text_scale: config.ui.text_scale,
            iris_index: config.tracking.iris_index,
            contour: EyeContour::for_eye(config.blink.eye),
        }
    }
}

/// Draws the tracked points and the four status lines on a copy of the frame.
pub fn annotate(frame: &RgbImage, detection: &Detection, report: &FrameReport, style: &AnnotationStyle) -> RgbImage {
    let mut out = frame.clone();

    if style.show_landmarks {
        if let Some(face) = &detection.face {
            for idx in style.contour.indices() {
                if let Some(p) = face.point(*idx) {
                    draw_dot(&mut out, p, 1, style.landmark_color);
                }
            }
            if let Some(iris) = face.point(style.iris_index) {
                draw_dot(&mut out, iris, 2, IRIS_COLOR);
            }
        }
        if let Some(hand) = &detection.hand {
            for p in hand.points() {
                draw_dot(&mut out, p, 2, style.landmark_color);
            }
        }
    }

    let lines = status_lines(report);
    let scale = style.text_scale.max(1);
    let pad = scale * 2;
    let mut y = pad;
    for line in &lines {
        let w = font::measure_text_width(line, scale);
        font::fill_rect(&mut out, pad / 2, y - pad / 2, w + pad, font::line_height(scale), TEXT_BACKGROUND);
        font::draw_text(&mut out, pad, y, line, TEXT_COLOR, scale);
        y += font::line_height(scale) + scale;
    }

    out
}

pub fn status_lines(report: &FrameReport) -> [String; 4] {
    let ratio = report
        .blink_ratio
        .map(|r| format!(" ({:.2})", r))
        .unwrap_or_default();
    [
        format!("ACTION: {}", report.action),
        format!("CURSOR: {}", report.cursor.as_str()),
        format!("BLINK: {}{}", report.blink.as_str(), ratio),
        format!("GESTURE: {}", report.gesture),
    ]
}

/// Square dot centred on a normalized landmark.
fn draw_dot(image: &mut RgbImage, p: &LandmarkPoint, radius: i64, color: Rgb<u8>) {
    let (w, h) = image.dimensions();
    let cx = (p.x * w as f32) as i64;
    let cy = (p.y * h as f32) as i64;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let (px, py) = (cx + dx, cy + dy);
            if px >= 0 && py >= 0 && (px as u32) < w && (py as u32) < h {
                image.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

// =========================================================================
// Window
// =========================================================================

pub struct WindowOutput {
    window: minifb::Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
    style: AnnotationStyle,
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize, style: AnnotationStyle) -> Result<Self> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                resize: true,
                ..minifb::WindowOptions::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("Failed to create window: {}", e))?;

        window.limit_update_rate(Some(std::time::Duration::from_micros(16600))); // ~60 FPS

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
            style,
        })
    }

    fn inputs(&self) -> Vec<UserInput> {
        if !self.window.is_open() {
            return vec![UserInput::Stop];
        }
        self.window
            .get_keys_pressed(minifb::KeyRepeat::No)
            .into_iter()
            .filter_map(|key| match key {
                minifb::Key::Key1 => Some(UserInput::ToggleCursor),
                minifb::Key::Key2 => Some(UserInput::ToggleClick),
                minifb::Key::Key3 => Some(UserInput::ToggleGestures),
                minifb::Key::Escape => Some(UserInput::Stop),
                _ => None,
            })
            .collect()
    }
}

impl FrameSink for WindowOutput {
    fn present(&mut self, frame: &Frame, detection: &Detection, report: &FrameReport) -> Result<Vec<UserInput>> {
        let annotated = annotate(&frame.image, detection, report, &self.style);

        let (w, h) = annotated.dimensions();
        if w as usize != self.width || h as usize != self.height {
            self.width = w as usize;
            self.height = h as usize;
        }
        self.buffer.resize(self.width * self.height, 0);

        for (dst, pixel) in self.buffer.iter_mut().zip(annotated.pixels()) {
            let [r, g, b] = pixel.0;
            *dst = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
        }

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| anyhow::anyhow!("Window update failed: {}", e))?;

        Ok(self.inputs())
    }
}

// =========================================================================
// Headless
// Logs status changes only, so long runs stay readable.
// =========================================================================

#[derive(Default)]
pub struct HeadlessSink {
    last: Option<[String; 4]>,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for HeadlessSink {
    fn present(&mut self, frame: &Frame, _detection: &Detection, report: &FrameReport) -> Result<Vec<UserInput>> {
        // the blink ratio changes every frame; compare without it
        let mut key = status_lines(report);
        key[2] = format!("BLINK: {}", report.blink.as_str());
        if self.last.as_ref() != Some(&key) {
            info!("[{:>6.2}s] {}", frame.timestamp, key.join(" | "));
            self.last = Some(key);
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{BlinkStatus, CursorStatus};
    use crate::synth::FaceBuilder;
    use crate::types::{Action, GestureLabel};

    fn report() -> FrameReport {
        FrameReport {
            cursor: CursorStatus::Tracking,
            blink: BlinkStatus::Detected,
            gesture: GestureLabel::Victory,
            action: Action::BlinkClick,
            blink_ratio: Some(0.123),
            cursor_position: None,
        }
    }

    #[test]
    fn status_lines_read_like_the_display() {
        let lines = status_lines(&report());
        assert_eq!(lines[0], "ACTION: Blink Click");
        assert_eq!(lines[1], "CURSOR: TRACKING");
        assert_eq!(lines[2], "BLINK: DETECTED (0.12)");
        assert_eq!(lines[3], "GESTURE: VICTORY");
    }

    #[test]
    fn annotate_marks_iris_and_keeps_size() {
        let frame = RgbImage::new(640, 480);
        let detection = Detection {
            face: Some(FaceBuilder::new().iris(0.9, 0.9).build()),
            hand: None,
        };
        let style = AnnotationStyle::from_config(&AppConfig::default());
        let out = annotate(&frame, &detection, &report(), &style);
        assert_eq!(out.dimensions(), (640, 480));
        assert_eq!(out.get_pixel(576, 432), &IRIS_COLOR);
    }
}
