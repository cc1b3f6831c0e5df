use anyhow::Result;
use clap::Parser;
use colored::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

use touchless::blink::{BlinkDetector, EyeContour};
use touchless::config::BlinkConfig;
use touchless::gesture::classify_hand;
use touchless::replay::read_recording;
use touchless::types::Eye;

/// Summarises a detection recording made with `touchless --record`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines recording
    recording: PathBuf,

    /// Eye used for the blink ratio
    #[arg(long, value_enum, default_value_t = EyeArg::Left)]
    eye: EyeArg,

    /// Blink threshold
    #[arg(long, default_value_t = BlinkConfig::default().threshold)]
    threshold: f32,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum EyeArg {
    Left,
    Right,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let frames = read_recording(&args.recording)?;

    let eye = match args.eye {
        EyeArg::Left => Eye::Left,
        EyeArg::Right => Eye::Right,
    };
    let detector = BlinkDetector::new(EyeContour::for_eye(eye), args.threshold);

    let mut with_face = 0usize;
    let mut with_hand = 0usize;
    let mut closed = 0usize;
    let mut min_ratio = f32::INFINITY;
    let mut max_ratio = f32::NEG_INFINITY;
    let mut gestures: BTreeMap<&'static str, usize> = BTreeMap::new();

    for frame in &frames {
        if let Some(face) = &frame.detection.face {
            with_face += 1;
            if let Some(reading) = detector.read(face) {
                min_ratio = min_ratio.min(reading.ratio);
                max_ratio = max_ratio.max(reading.ratio);
                if reading.closed {
                    closed += 1;
                }
            }
        }
        if let Some(hand) = &frame.detection.hand {
            with_hand += 1;
            *gestures.entry(classify_hand(hand).as_str()).or_insert(0) += 1;
        }
    }

    println!("{}", format!("Recording: {}", args.recording.display()).bold());
    println!("Frames: {}", frames.len());
    if let (Some(first), Some(last)) = (frames.first(), frames.last()) {
        println!("Span: {:.2}s .. {:.2}s ({:.2}s)", first.t, last.t, last.t - first.t);
    }
    println!("Face present: {} ({:.1}%)", with_face, percent(with_face, frames.len()));
    println!("Hand present: {} ({:.1}%)", with_hand, percent(with_hand, frames.len()));

    if min_ratio.is_finite() {
        println!(
            "Blink ratio: min {:.3}, max {:.3}, below {:.2} in {} frames",
            min_ratio, max_ratio, args.threshold, closed
        );
    } else {
        println!("{}", "Blink ratio: no readable eye contour".yellow());
    }

    if gestures.is_empty() {
        println!("Gestures: none");
    } else {
        println!("Gestures (per frame, before cooldown):");
        for (label, count) in &gestures {
            println!("  {:<10} {}", label, count);
        }
    }

    Ok(())
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
