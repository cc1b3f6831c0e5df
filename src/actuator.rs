use enigo::{Axis, Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use log::{debug, info};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::ActuatorError;
use crate::types::ScreenSize;

/// Wheel units per detent, Windows convention.
const WHEEL_DELTA: f64 = 120.0;

/// OS-level side effects requested by the session. All calls block.
pub trait Actuator {
    fn name(&self) -> String;

    /// Size of the primary display, if the backend can tell.
    fn screen_size(&self) -> Option<ScreenSize> {
        None
    }

    /// Animated move to an absolute position over roughly `duration`.
    fn move_cursor(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), ActuatorError>;
    fn click(&mut self) -> Result<(), ActuatorError>;
    /// Wheel units, negative scrolls the viewport down.
    fn scroll(&mut self, delta: i32) -> Result<(), ActuatorError>;
    fn press_key(&mut self, key: &str) -> Result<(), ActuatorError>;
    fn open_url(&mut self, url: &str) -> Result<(), ActuatorError>;
}

/// One requested side effect, as seen by a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorCall {
    Move { x: i32, y: i32 },
    Click,
    Scroll(i32),
    Key(String),
    OpenUrl(String),
}

// =========================================================================
// System actuator (enigo)
// =========================================================================

pub struct EnigoActuator {
    enigo: Enigo,
}

impl EnigoActuator {
    pub fn new() -> Result<Self, ActuatorError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| ActuatorError::Backend(format!("failed to connect input backend: {:?}", e)))?;
        Ok(Self { enigo })
    }
}

impl Actuator for EnigoActuator {
    fn name(&self) -> String {
        "System input (enigo)".to_string()
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        self.enigo
            .main_display()
            .ok()
            .map(|(w, h)| ScreenSize::new(w, h))
    }

    fn move_cursor(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), ActuatorError> {
        let steps = (duration.as_millis() / 10).max(1) as i32;
        let (from_x, from_y) = self.enigo.location().unwrap_or((x, y));
        let pause = duration / steps as u32;

        for step in 1..=steps {
            let px = from_x + (x - from_x) * step / steps;
            let py = from_y + (y - from_y) * step / steps;
            self.enigo
                .move_mouse(px, py, Coordinate::Abs)
                .map_err(backend)?;
            if step < steps {
                thread::sleep(pause);
            }
        }
        Ok(())
    }

    fn click(&mut self) -> Result<(), ActuatorError> {
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(backend)
    }

    fn scroll(&mut self, delta: i32) -> Result<(), ActuatorError> {
        self.enigo
            .scroll(wheel_notches(delta), Axis::Vertical)
            .map_err(backend)
    }

    fn press_key(&mut self, key: &str) -> Result<(), ActuatorError> {
        let key = named_key(key).ok_or_else(|| ActuatorError::Unsupported(format!("key '{}'", key)))?;
        self.enigo.key(key, Direction::Click).map_err(backend)
    }

    fn open_url(&mut self, url: &str) -> Result<(), ActuatorError> {
        open_with_system(url)
    }
}

fn backend(e: enigo::InputError) -> ActuatorError {
    ActuatorError::Backend(format!("{:?}", e))
}

/// enigo scrolls down for positive lengths; our deltas are negative-down.
pub fn wheel_notches(delta: i32) -> i32 {
    let notches = (-(delta as f64) / WHEEL_DELTA).round() as i32;
    if notches == 0 && delta != 0 {
        -delta.signum()
    } else {
        notches
    }
}

fn named_key(name: &str) -> Option<Key> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        #[cfg(not(target_os = "macos"))]
        "playpause" | "play_pause" | "mediaplaypause" => Some(Key::MediaPlayPause),
        "space" => Some(Key::Space),
        "enter" | "return" => Some(Key::Return),
        "escape" | "esc" => Some(Key::Escape),
        "pagedown" => Some(Key::PageDown),
        "pageup" => Some(Key::PageUp),
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Key::Unicode(c)),
                _ => None,
            }
        }
    }
}

/// Hands the URL to the desktop's default handler without waiting on it.
pub fn open_with_system(url: &str) -> Result<(), ActuatorError> {
    let command = opener_command(url)
        .ok_or_else(|| ActuatorError::Unsupported("no URL opener on this platform".to_string()))?;
    launch_detached(command).map(|_| ())
}

/// Spawns `command` and reaps it on a background thread, so a finished
/// opener never lingers as a zombie. The handle yields its exit status.
pub fn launch_detached(mut command: Command) -> Result<JoinHandle<Option<ExitStatus>>, ActuatorError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ActuatorError::Unsupported(format!("URL opener missing: {}", e)),
            _ => ActuatorError::Backend(format!("failed to launch URL opener: {}", e)),
        })?;

    Ok(thread::spawn(move || match child.wait() {
        Ok(status) => {
            if !status.success() {
                debug!("URL opener exited with {}", status);
            }
            Some(status)
        }
        Err(e) => {
            debug!("Failed to reap URL opener: {}", e);
            None
        }
    }))
}

fn opener_command(url: &str) -> Option<Command> {
    if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        Some(c)
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        Some(c)
    } else if cfg!(unix) {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        Some(c)
    } else {
        None
    }
}

// =========================================================================
// Dry run
// Logs and records every call instead of touching the desktop.
// =========================================================================

#[derive(Debug, Default)]
pub struct DryRunActuator {
    pub calls: Vec<ActuatorCall>,
    screen: Option<ScreenSize>,
    /// Keys reported as unsupported, to mimic hosts without media keys.
    pub unsupported_keys: Vec<String>,
}

impl DryRunActuator {
    pub fn new(screen: Option<ScreenSize>) -> Self {
        Self {
            calls: Vec::new(),
            screen,
            unsupported_keys: Vec::new(),
        }
    }

    pub fn count(&self, pred: impl Fn(&ActuatorCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl Actuator for DryRunActuator {
    fn name(&self) -> String {
        "Dry run".to_string()
    }

    fn screen_size(&self) -> Option<ScreenSize> {
        self.screen
    }

    fn move_cursor(&mut self, x: i32, y: i32, _duration: Duration) -> Result<(), ActuatorError> {
        debug!("[dry-run] move to ({}, {})", x, y);
        self.calls.push(ActuatorCall::Move { x, y });
        Ok(())
    }

    fn click(&mut self) -> Result<(), ActuatorError> {
        info!("[dry-run] click");
        self.calls.push(ActuatorCall::Click);
        Ok(())
    }

    fn scroll(&mut self, delta: i32) -> Result<(), ActuatorError> {
        info!("[dry-run] scroll {}", delta);
        self.calls.push(ActuatorCall::Scroll(delta));
        Ok(())
    }

    fn press_key(&mut self, key: &str) -> Result<(), ActuatorError> {
        if self.unsupported_keys.iter().any(|k| k == key) {
            return Err(ActuatorError::Unsupported(format!("key '{}'", key)));
        }
        info!("[dry-run] press {}", key);
        self.calls.push(ActuatorCall::Key(key.to_string()));
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> Result<(), ActuatorError> {
        info!("[dry-run] open {}", url);
        self.calls.push(ActuatorCall::OpenUrl(url.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_deltas_become_downward_notches() {
        assert_eq!(wheel_notches(-300), 3);
        assert_eq!(wheel_notches(-120), 1);
        assert_eq!(wheel_notches(240), -2);
        assert_eq!(wheel_notches(-10), 1);
        assert_eq!(wheel_notches(0), 0);
    }

    #[cfg(unix)]
    #[test]
    fn detached_launch_is_reaped() {
        let handle = launch_detached(Command::new("true")).unwrap();
        let status = handle.join().unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[test]
    fn missing_opener_is_unsupported() {
        let err = launch_detached(Command::new("definitely-not-an-opener-binary")).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn key_names() {
        assert_eq!(named_key("space"), Some(Key::Space));
        assert_eq!(named_key("a"), Some(Key::Unicode('a')));
        assert_eq!(named_key("definitely-not-a-key"), None);
    }

    #[test]
    fn dry_run_reports_configured_keys_as_unsupported() {
        let mut a = DryRunActuator::new(None);
        a.unsupported_keys.push("playpause".to_string());
        assert!(a.press_key("playpause").unwrap_err().is_unsupported());
        assert!(a.calls.is_empty());
        a.click().unwrap();
        assert_eq!(a.count(|c| *c == ActuatorCall::Click), 1);
    }
}
