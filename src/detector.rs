use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::camera::Frame;
use crate::pipeline::LandmarkSource;
use crate::types::{Detection, FaceLandmarks, HandLandmarks, LandmarkPoint};

#[derive(Serialize)]
struct DetectRequest<'a> {
    image_path: &'a str,
    frame: u64,
}

#[derive(Deserialize, Debug)]
struct DetectResponse {
    status: String,
    #[serde(default)]
    face: Option<Vec<LandmarkPoint>>,
    #[serde(default)]
    hand: Option<Vec<LandmarkPoint>>,
    #[serde(default)]
    error: Option<String>,
}

/// Landmark detector running as a child process.
///
/// Protocol: one JSON request per line on the child's stdin
/// (`{"image_path": ..., "frame": n}`), one JSON response per line on its
/// stdout (`{"status": "success", "face": [...], "hand": [...]}`). Frames
/// are handed over as a JPEG in the temp directory.
pub struct ProcessDetector {
    command: String,
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    frame_path: PathBuf,
}

impl ProcessDetector {
    /// `command` is split on whitespace into program and arguments.
    pub fn spawn(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts.next().context("Detector command is empty")?;

        info!("Launching landmark detector: {}", command);
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to spawn detector '{}'", command))?;

        let stdin = child.stdin.take().context("Failed to open stdin to detector")?;
        let stdout = child.stdout.take().context("Failed to open stdout from detector")?;

        let frame_path = std::env::temp_dir().join(format!("touchless_frame_{}.jpg", std::process::id()));

        Ok(Self {
            command: command.to_string(),
            process: child,
            stdin,
            stdout: BufReader::new(stdout),
            frame_path,
        })
    }
}

impl LandmarkSource for ProcessDetector {
    fn name(&self) -> String {
        format!("Detector process ({})", self.command)
    }

    fn detect(&mut self, frame: &Frame) -> Result<Detection> {
        frame
            .image
            .save(&self.frame_path)
            .context("Failed to save temporary frame")?;

        let image_path = self.frame_path.to_string_lossy();
        let request = DetectRequest {
            image_path: &image_path,
            frame: frame.index,
        };
        let request_json = serde_json::to_string(&request)?;
        writeln!(self.stdin, "{}", request_json).context("Failed to write to detector stdin")?;
        self.stdin.flush()?;

        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .context("Failed to read from detector stdout")?;
        if read == 0 {
            bail!("Detector exited before answering frame {}", frame.index);
        }

        parse_response(&line)
    }
}

impl Drop for ProcessDetector {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
        let _ = std::fs::remove_file(&self.frame_path);
        info!("Landmark detector stopped");
    }
}

/// A malformed hand is dropped with a warning; the face survives.
fn parse_response(line: &str) -> Result<Detection> {
    let response: DetectResponse =
        serde_json::from_str(line.trim()).context("Failed to parse detector response")?;

    if response.status != "success" {
        bail!("Detector error: {}", response.error.unwrap_or_else(|| response.status.clone()));
    }

    let hand = match response.hand {
        Some(points) => match HandLandmarks::new(points) {
            Ok(hand) => Some(hand),
            Err(e) => {
                warn!("Ignoring hand: {}", e);
                None
            }
        },
        None => None,
    };

    Ok(Detection {
        face: response.face.map(FaceLandmarks::new),
        hand,
    })
}
