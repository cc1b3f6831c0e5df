//! JSON-lines recordings of detections, one object per frame:
//! `{"t": 1.25, "face": [...], "hand": [...]}`.

use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::camera::{Frame, SyntheticFrames};
use crate::pipeline::LandmarkSource;
use crate::types::Detection;

/// Size of the placeholder frames shown while replaying.
const REPLAY_FRAME_SIZE: (u32, u32) = (640, 480);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub t: f64,
    #[serde(flatten)]
    pub detection: Detection,
}

pub fn read_recording(path: &Path) -> Result<Vec<RecordedFrame>> {
    let file = File::open(path).with_context(|| format!("Failed to open recording {}", path.display()))?;
    let mut frames = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: RecordedFrame = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid recording line", path.display(), n + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// `recording_YYYYmmdd_HHMMSS.jsonl` in the working directory.
pub fn default_recording_path() -> PathBuf {
    PathBuf::from(format!(
        "recording_{}.jsonl",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Opens a recording as a frame clock plus the matching detections.
/// The two halves must be driven together, frame index for frame index.
pub fn open_replay(path: &Path) -> Result<(SyntheticFrames, ReplayLandmarks)> {
    let recorded = read_recording(path)?;
    info!("Replaying {} frames from {}", recorded.len(), path.display());

    let (timestamps, detections): (Vec<f64>, Vec<Detection>) =
        recorded.into_iter().map(|r| (r.t, r.detection)).unzip();
    let (w, h) = REPLAY_FRAME_SIZE;
    Ok((
        SyntheticFrames::with_timestamps(w, h, timestamps),
        ReplayLandmarks {
            source: path.display().to_string(),
            detections,
        },
    ))
}

pub struct ReplayLandmarks {
    source: String,
    detections: Vec<Detection>,
}

impl LandmarkSource for ReplayLandmarks {
    fn name(&self) -> String {
        format!("Replay ({})", self.source)
    }

    fn detect(&mut self, frame: &Frame) -> Result<Detection> {
        match self.detections.get(frame.index as usize) {
            Some(d) => Ok(d.clone()),
            None => bail!("Recording has no frame {}", frame.index),
        }
    }
}

/// Wraps a landmark source and writes everything it reports to a file.
/// An existing file is truncated: one recording holds one timeline.
pub struct Recorder<L> {
    inner: L,
    writer: BufWriter<File>,
    path: PathBuf,
    written: u64,
}

impl<L: LandmarkSource> Recorder<L> {
    pub fn create(inner: L, path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to open recording {}", path.display()))?;
        info!("Recording detections to {}", path.display());
        Ok(Self {
            inner,
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl<L: LandmarkSource> LandmarkSource for Recorder<L> {
    fn name(&self) -> String {
        format!("{} -> {}", self.inner.name(), self.path.display())
    }

    fn detect(&mut self, frame: &Frame) -> Result<Detection> {
        let detection = self.inner.detect(frame)?;
        let line = RecordedFrame {
            t: frame.timestamp,
            detection,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().context("Failed to flush recording")?;
        self.written += 1;
        Ok(line.detection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn bad_line_reports_its_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.jsonl");
        fs::write(&path, "{\"t\": 0.0}\n\n{\"t\": oops}\n").unwrap();
        let err = read_recording(&path).unwrap_err();
        assert!(format!("{:#}", err).contains(":3:"));
    }

    #[test]
    fn recorder_truncates_existing_file() {
        use crate::camera::{FrameSource, SyntheticFrames};
        use crate::pipeline::SimulatedSource;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.jsonl");
        fs::write(&path, "{\"t\": 9.0}\n{\"t\": 9.5}\n{\"t\": 10.0}\n").unwrap();

        let mut frames = SyntheticFrames::at_rate(8, 6, 10.0, Some(2));
        let mut recorder = Recorder::create(SimulatedSource::new(), &path).unwrap();
        while let Some(frame) = frames.capture().unwrap() {
            recorder.detect(&frame).unwrap();
        }
        drop(recorder);

        let stamps: Vec<f64> = read_recording(&path).unwrap().iter().map(|f| f.t).collect();
        assert_eq!(stamps, vec![0.0, 0.1]);
    }

    #[test]
    fn empty_detection_line_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.jsonl");
        fs::write(&path, "{\"t\": 0.5}\n").unwrap();
        let frames = read_recording(&path).unwrap();
        assert_eq!(frames, vec![RecordedFrame { t: 0.5, detection: Detection::empty() }]);
    }
}
