use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use log::{info, warn};
use std::path::PathBuf;

mod args;

use args::{Args, SourceKind};
use touchless::actuator::{Actuator, ActuatorCall, DryRunActuator, EnigoActuator};
use touchless::camera::{self, CameraSource, FrameSource, SyntheticFrames};
use touchless::config::AppConfig;
use touchless::detector::ProcessDetector;
use touchless::output::{AnnotationStyle, FrameSink, HeadlessSink, WindowOutput};
use touchless::pipeline::{LandmarkSource, SimulatedSource};
use touchless::replay::{default_recording_path, open_replay, Recorder};
use touchless::session::{Session, StopReason};
use touchless::types::ScreenSize;

/// Used when neither the config nor the input backend knows the display.
const FALLBACK_SCREEN: ScreenSize = ScreenSize {
    width: 1920,
    height: 1080,
};

const SIMULATED_FPS: f64 = 30.0;

fn open_sources(args: &Args, config: &AppConfig) -> Result<(Box<dyn FrameSource>, Box<dyn LandmarkSource>)> {
    match args.source {
        SourceKind::Camera => {
            let command = args
                .detector
                .as_deref()
                .context("--source camera needs --detector <command> (or try --source simulate)")?;
            let camera = CameraSource::new(args.cam_index, config.tracking.mirror)?;
            println!("Resolution: {}x{}", camera.width(), camera.height());
            Ok((Box::new(camera), Box::new(ProcessDetector::spawn(command)?)))
        }
        SourceKind::Simulate => Ok((
            Box::new(SyntheticFrames::at_rate(640, 480, SIMULATED_FPS, None).paced()),
            Box::new(SimulatedSource::new()),
        )),
        SourceKind::Replay => {
            let path = args
                .replay
                .as_deref()
                .context("--source replay needs --replay <file>")?;
            let (frames, landmarks) = open_replay(path)?;
            Ok((Box::new(frames), Box::new(landmarks)))
        }
    }
}

fn screen_size(config: &AppConfig, actuator: &dyn Actuator) -> ScreenSize {
    if let (Some(w), Some(h)) = (config.tracking.screen_width, config.tracking.screen_height) {
        return ScreenSize::new(w, h);
    }
    match actuator.screen_size() {
        Some(s) if s.width > 0 && s.height > 0 => s,
        _ => {
            warn!(
                "Screen size unknown, assuming {}x{}",
                FALLBACK_SCREEN.width, FALLBACK_SCREEN.height
            );
            FALLBACK_SCREEN
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list {
        return camera::list_cameras();
    }

    // 0. Load Config
    let mut config = AppConfig::load(&args.config)?;
    args.apply_to(&mut config);
    let config = config.sanitized();

    // 1. Setup Sources
    let (mut frames, mut landmarks) = open_sources(&args, &config)?;
    if let Some(record) = &args.record {
        let path = if record == "auto" {
            default_recording_path()
        } else {
            PathBuf::from(record)
        };
        landmarks = Box::new(Recorder::create(landmarks, &path)?);
    }
    println!("Frames: {}", frames.name());
    println!("Landmarks: {}", landmarks.name());

    // 2. Setup Actuator
    let mut dry_run = DryRunActuator::new(None);
    let mut system = if args.dry_run {
        None
    } else {
        Some(EnigoActuator::new().context("Failed to initialise mouse control (try --dry-run)")?)
    };
    let actuator: &mut dyn Actuator = match system.as_mut() {
        Some(a) => a,
        None => &mut dry_run,
    };
    let screen = screen_size(&config, actuator);
    println!("Actuator: {} on {}x{}", actuator.name(), screen.width, screen.height);

    // 3. Setup Output
    let mut sink: Box<dyn FrameSink> = if args.headless {
        Box::new(HeadlessSink::new())
    } else {
        Box::new(WindowOutput::new(
            "Touchless",
            640,
            480,
            AnnotationStyle::from_config(&config),
        )?)
    };

    println!(
        "Cursor [{}]  Blink Click [{}]  Gestures [{}]",
        flag(config.tracking.enable_cursor),
        flag(config.tracking.enable_click),
        flag(config.tracking.enable_gestures)
    );
    if !args.headless {
        println!("Controls: [1] Cursor [2] Blink Click [3] Gestures [Esc] Stop");
    }
    println!("{}", "Starting...".green());

    // 4. Loop
    let mut session = Session::new(&config, screen);
    let reason = session.run(
        frames.as_mut(),
        landmarks.as_mut(),
        actuator,
        sink.as_mut(),
        args.max_frames,
    );

    // 5. Summary
    print_summary(&session, &reason);
    if args.dry_run {
        print_dry_run(&dry_run.calls);
    }

    match reason {
        StopReason::CaptureFailed(e) => bail!("Capture failed: {}", e),
        StopReason::DetectorFailed(e) => bail!("Detector failed: {}", e),
        StopReason::DisplayFailed(e) => bail!("Display failed: {}", e),
        _ => Ok(()),
    }
}

fn flag(on: bool) -> ColoredString {
    if on {
        "ON".green()
    } else {
        "OFF".red()
    }
}

fn print_summary(session: &Session, reason: &StopReason) {
    let stats = session.stats();
    let reason_text = match reason {
        StopReason::UserStop | StopReason::CaptureEnded | StopReason::FrameLimit => reason.to_string().green(),
        StopReason::EmergencyGesture => reason.to_string().yellow(),
        _ => reason.to_string().red(),
    };

    println!();
    println!("{}", "Session ended".bold());
    println!("  Reason:   {}", reason_text);
    println!(
        "  Frames:   {} (face {}, hand {})",
        stats.frames, stats.frames_with_face, stats.frames_with_hand
    );
    println!("  Clicks:   {}", stats.clicks);
    for (label, count) in &stats.gestures {
        println!("  {:<9} {}", format!("{}:", label), count);
    }
    info!("Final cursor position {:?}", session.cursor());
}

fn print_dry_run(calls: &[ActuatorCall]) {
    let count = |f: fn(&ActuatorCall) -> bool| calls.iter().filter(|c| f(c)).count();
    println!("{}", "Dry run actions".bold());
    println!("  Moves:    {}", count(|c| matches!(c, ActuatorCall::Move { .. })));
    println!("  Clicks:   {}", count(|c| matches!(c, ActuatorCall::Click)));
    println!("  Scrolls:  {}", count(|c| matches!(c, ActuatorCall::Scroll(_))));
    println!("  Keys:     {}", count(|c| matches!(c, ActuatorCall::Key(_))));
    println!("  URLs:     {}", count(|c| matches!(c, ActuatorCall::OpenUrl(_))));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_screen_size_wins() {
        let mut config = AppConfig::default();
        config.tracking.screen_width = Some(1280);
        config.tracking.screen_height = Some(720);
        let a = DryRunActuator::new(Some(ScreenSize::new(800, 600)));
        assert_eq!(screen_size(&config, &a), ScreenSize::new(1280, 720));
    }

    #[test]
    fn falls_back_when_nothing_knows() {
        let a = DryRunActuator::new(None);
        assert_eq!(screen_size(&AppConfig::default(), &a), FALLBACK_SCREEN);
        let b = DryRunActuator::new(Some(ScreenSize::new(800, 600)));
        assert_eq!(screen_size(&AppConfig::default(), &b), ScreenSize::new(800, 600));
    }

    #[test]
    fn cli_overrides_are_sanitized() {
        let args = Args::parse_from(["touchless", "--smoothing", "42", "--sens-x", "0.2", "--no-click"]);
        let mut config = AppConfig::default();
        args.apply_to(&mut config);
        let config = config.sanitized();
        assert_eq!(config.tracking.smoothing, 10);
        assert_eq!(config.tracking.sensitivity_x, 1.0);
        assert!(!config.tracking.enable_click);
        assert!(config.tracking.enable_cursor);
    }
}
