use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Webcam frames, landmarks from the --detector process
    Camera,
    /// Synthetic frames and landmarks
    Simulate,
    /// A recording made with --record
    Replay,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (created with defaults if missing)
    #[arg(long, default_value = touchless::config::DEFAULT_PATH)]
    pub config: PathBuf,

    /// Where frames and landmarks come from
    #[arg(long, value_enum, default_value_t = SourceKind::Camera)]
    pub source: SourceKind,

    /// Camera Index (default 0)
    #[arg(short, long, default_value_t = 0)]
    pub cam_index: u32,

    /// Landmark detector command, e.g. "python3 scripts/landmarks.py"
    #[arg(long)]
    pub detector: Option<String>,

    /// Recording to play back with --source replay
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Append every detection to this JSON-lines file ("auto" picks a timestamped name)
    #[arg(long)]
    pub record: Option<String>,

    /// Log actions instead of moving the real mouse
    #[arg(long)]
    pub dry_run: bool,

    /// No window; statuses go to the log
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many frames
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Cursor smoothing 1-10 (overrides config)
    #[arg(long)]
    pub smoothing: Option<u32>,

    /// Horizontal sensitivity 1.0-5.0 (overrides config)
    #[arg(long)]
    pub sens_x: Option<f32>,

    /// Vertical sensitivity 1.0-5.0 (overrides config)
    #[arg(long)]
    pub sens_y: Option<f32>,

    #[arg(long)]
    pub no_cursor: bool,

    #[arg(long)]
    pub no_click: bool,

    #[arg(long)]
    pub no_gestures: bool,

    /// List available cameras
    #[arg(long)]
    pub list: bool,
}

impl Args {
    /// Applies command-line overrides; the result still needs `sanitized()`.
    pub fn apply_to(&self, config: &mut touchless::config::AppConfig) {
        let t = &mut config.tracking;
        if let Some(n) = self.smoothing {
            t.smoothing = n;
        }
        if let Some(s) = self.sens_x {
            t.sensitivity_x = s;
        }
        if let Some(s) = self.sens_y {
            t.sensitivity_y = s;
        }
        if self.no_cursor {
            t.enable_cursor = false;
        }
        if self.no_click {
            t.enable_click = false;
        }
        if self.no_gestures {
            t.enable_gestures = false;
        }
    }
}
