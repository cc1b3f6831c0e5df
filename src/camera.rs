use anyhow::{anyhow, Context, Result};
use colored::*;
use image::{Rgb, RgbImage};
use log::{debug, warn};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};
use std::thread;
use std::time::{Duration, Instant};

/// One captured frame. `timestamp` is seconds since the source opened.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub timestamp: f64,
    pub index: u64,
}

/// Where frames come from. `Ok(None)` means the stream has ended.
pub trait FrameSource {
    fn name(&self) -> String;
    fn capture(&mut self) -> Result<Option<Frame>>;
}

pub struct CameraSource {
    camera: Camera,
    mirror: bool,
    started: Instant,
    next_index: u64,
}

impl CameraSource {
    pub fn new(index: u32, mirror: bool) -> Result<Self> {
        let cam_index = CameraIndex::Index(index);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(cam_index, requested).context("Failed to create camera instance")?;

        camera
            .open_stream()
            .map_err(|e| anyhow!(e))
            .context("Failed to open camera stream")?;

        println!("{}", format!("Opened camera: {}", camera.info().human_name()).green());
        println!("Format: {}", camera.camera_format());

        Ok(Self {
            camera,
            mirror,
            started: Instant::now(),
            next_index: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.camera.resolution().width()
    }

    pub fn height(&self) -> u32 {
        self.camera.resolution().height()
    }
}

impl FrameSource for CameraSource {
    fn name(&self) -> String {
        self.camera.info().human_name()
    }

    fn capture(&mut self) -> Result<Option<Frame>> {
        let buffer = self.camera.frame().map_err(|e| anyhow!(e)).context("Failed to get frame")?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| anyhow!(e))
            .context("Failed to decode frame")?;

        // Rebuilt from raw bytes so the image crate version nokhwa links
        // against doesn't leak into our types.
        let (width, height) = (decoded.width(), decoded.height());
        let mut image = RgbImage::from_raw(width, height, decoded.into_raw())
            .context("Decoded frame has an unexpected size")?;

        if self.mirror {
            image::imageops::flip_horizontal_in_place(&mut image);
        }

        let frame = Frame {
            image,
            timestamp: self.started.elapsed().as_secs_f64(),
            index: self.next_index,
        };
        self.next_index += 1;
        Ok(Some(frame))
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("Failed to stop camera stream: {}", e);
        } else {
            debug!("Camera stream released");
        }
    }
}

/// Prints the cameras the native backend can see.
pub fn list_cameras() -> Result<()> {
    let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| anyhow!(e))?;
    println!("Available Cameras:");
    println!("{:<5} | {:<30} | {:<10}", "Index", "Name", "Misc");
    println!("{}", "-".repeat(60));
    for cam in cameras {
        println!("{:<5} | {:<30} | {:?}", cam.index(), cam.human_name(), cam.misc());
    }
    Ok(())
}

/// Blank frames on a fixed clock, for simulated and replayed sessions.
///
/// Timestamps come from the frame rate (or a supplied list), not the wall
/// clock, so runs are reproducible. [`SyntheticFrames::paced`] additionally
/// holds each frame back until its timestamp has elapsed.
pub struct SyntheticFrames {
    width: u32,
    height: u32,
    timestamps: Timeline,
    next_index: u64,
    pacing: Pacing,
}

enum Pacing {
    Unpaced,
    WallClock { started: Option<Instant> },
}

enum Timeline {
    Rate { fps: f64, limit: Option<u64> },
    Fixed(Vec<f64>),
}

impl SyntheticFrames {
    pub fn at_rate(width: u32, height: u32, fps: f64, limit: Option<u64>) -> Self {
        Self {
            width,
            height,
            timestamps: Timeline::Rate {
                fps: if fps > 0.0 { fps } else { 30.0 },
                limit,
            },
            next_index: 0,
            pacing: Pacing::Unpaced,
        }
    }

    pub fn with_timestamps(width: u32, height: u32, timestamps: Vec<f64>) -> Self {
        Self {
            width,
            height,
            timestamps: Timeline::Fixed(timestamps),
            next_index: 0,
            pacing: Pacing::Unpaced,
        }
    }

    /// Delivers frame `n` no earlier than `timestamp(n)` after the first capture.
    pub fn paced(mut self) -> Self {
        self.pacing = Pacing::WallClock { started: None };
        self
    }

    fn wait_for(&mut self, timestamp: f64) {
        if let Pacing::WallClock { started } = &mut self.pacing {
            let started = *started.get_or_insert_with(Instant::now);
            let due = started + Duration::from_secs_f64(timestamp.max(0.0));
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
    }

    fn timestamp(&self, index: u64) -> Option<f64> {
        match &self.timestamps {
            Timeline::Rate { fps, limit } => match limit {
                Some(max) if index >= *max => None,
                _ => Some(index as f64 / fps),
            },
            Timeline::Fixed(ts) => ts.get(index as usize).copied(),
        }
    }
}

impl FrameSource for SyntheticFrames {
    fn name(&self) -> String {
        match self.timestamps {
            Timeline::Rate { fps, .. } => format!("Synthetic {}x{} @ {:.0} fps", self.width, self.height, fps),
            Timeline::Fixed(ref ts) => format!("Replayed clock ({} frames)", ts.len()),
        }
    }

    fn capture(&mut self) -> Result<Option<Frame>> {
        let Some(timestamp) = self.timestamp(self.next_index) else {
            return Ok(None);
        };
        self.wait_for(timestamp);
        let frame = Frame {
            image: RgbImage::from_pixel(self.width, self.height, Rgb([32, 32, 32])),
            timestamp,
            index: self.next_index,
        };
        self.next_index += 1;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_frames_end_at_limit() {
        let mut src = SyntheticFrames::at_rate(8, 6, 10.0, Some(3));
        let mut stamps = Vec::new();
        while let Some(f) = src.capture().unwrap() {
            assert_eq!(f.image.dimensions(), (8, 6));
            stamps.push(f.timestamp);
        }
        assert_eq!(stamps, vec![0.0, 0.1, 0.2]);
    }

    #[test]
    fn paced_frames_follow_the_wall_clock() {
        let mut src = SyntheticFrames::at_rate(4, 4, 20.0, Some(4)).paced();
        let start = Instant::now();
        while src.capture().unwrap().is_some() {}
        // the last frame is due 3/20 s after the first
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn unpaced_frames_do_not_wait() {
        let mut src = SyntheticFrames::at_rate(4, 4, 1.0, Some(3));
        let start = Instant::now();
        while src.capture().unwrap().is_some() {}
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn fixed_timeline_replays_stamps() {
        let mut src = SyntheticFrames::with_timestamps(4, 4, vec![1.5, 1.75]);
        assert_eq!(src.capture().unwrap().map(|f| (f.index, f.timestamp)), Some((0, 1.5)));
        assert_eq!(src.capture().unwrap().map(|f| (f.index, f.timestamp)), Some((1, 1.75)));
        assert!(src.capture().unwrap().is_none());
    }
}
