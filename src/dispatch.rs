use log::{debug, info, warn};

use crate::actuator::Actuator;
use crate::config::GestureConfig;
use crate::cooldown::CooldownTimer;
use crate::error::ActuatorError;
use crate::types::{Action, GestureLabel};

/// What one gesture frame produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// The label that fired, `None` when nothing fired.
    pub fired: GestureLabel,
    pub action: Option<Action>,
    pub stop_requested: bool,
}

impl Dispatch {
    fn nothing() -> Self {
        Self {
            fired: GestureLabel::None,
            action: None,
            stop_requested: false,
        }
    }
}

/// Maps gestures onto actuator calls behind a single shared cooldown.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    cooldown: CooldownTimer,
    config: GestureConfig,
}

impl ActionDispatcher {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            cooldown: CooldownTimer::new(config.cooldown_s),
            config,
        }
    }

    pub fn cooldown(&self) -> &CooldownTimer {
        &self.cooldown
    }

    pub fn dispatch(&mut self, label: GestureLabel, now: f64, actuator: &mut dyn Actuator) -> Dispatch {
        if label.is_none() {
            return Dispatch::nothing();
        }
        if !self.cooldown.ready(now) {
            debug!("{} suppressed by gesture cooldown", label);
            return Dispatch::nothing();
        }

        self.cooldown.stamp(now);
        let (action, result) = match label {
            GestureLabel::OpenPalm => (Action::OpeningBrowser, actuator.open_url(&self.config.browser_url)),
            GestureLabel::Victory => {
                // Stamped in the past, so the next scroll comes a little sooner.
                self.cooldown.stamp(now - self.config.victory_credit_s);
                (Action::Scrolling, actuator.scroll(self.config.scroll_delta))
            }
            GestureLabel::ThumbsUp => (Action::PlayPause, actuator.press_key(&self.config.media_key)),
            GestureLabel::Fist => (Action::EmergencyStop, Ok(())),
            GestureLabel::None => return Dispatch::nothing(),
        };

        info!("Gesture {} -> {}", label, action);
        report_failure(label, result);

        Dispatch {
            fired: label,
            action: Some(action),
            stop_requested: label == GestureLabel::Fist,
        }
    }
}

/// Failed actions still count as fired; the label stays visible.
fn report_failure(label: GestureLabel, result: Result<(), ActuatorError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_unsupported() => debug!("{} is a no-op here: {}", label, e),
        Err(e) => warn!("{} failed: {}", label, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{ActuatorCall, DryRunActuator};

    fn dispatcher() -> ActionDispatcher {
        ActionDispatcher::new(GestureConfig::default())
    }

    #[test]
    fn none_never_touches_the_timer() {
        let mut d = dispatcher();
        let mut a = DryRunActuator::new(None);
        let out = d.dispatch(GestureLabel::None, 5.0, &mut a);
        assert_eq!(out.fired, GestureLabel::None);
        assert_eq!(d.cooldown().last_fire(), None);
        assert!(a.calls.is_empty());
    }

    #[test]
    fn open_palm_opens_browser_once_per_window() {
        let mut d = dispatcher();
        let mut a = DryRunActuator::new(None);
        let first = d.dispatch(GestureLabel::OpenPalm, 1.0, &mut a);
        assert_eq!(first.action, Some(Action::OpeningBrowser));
        let second = d.dispatch(GestureLabel::OpenPalm, 1.9, &mut a);
        assert_eq!(second.fired, GestureLabel::None);
        assert_eq!(
            a.calls,
            vec![ActuatorCall::OpenUrl("https://www.google.com".to_string())]
        );
    }

    #[test]
    fn victory_gets_a_shorter_cooldown() {
        let mut d = dispatcher();
        let mut a = DryRunActuator::new(None);
        assert_eq!(d.dispatch(GestureLabel::Victory, 10.0, &mut a).fired, GestureLabel::Victory);
        let stamped = d.cooldown().last_fire().unwrap();
        assert!((stamped - 9.8).abs() < 1e-9);

        assert_eq!(d.dispatch(GestureLabel::Victory, 10.1, &mut a).fired, GestureLabel::None);
        assert_eq!(d.dispatch(GestureLabel::Victory, 10.85, &mut a).fired, GestureLabel::Victory);
        assert_eq!(a.count(|c| matches!(c, ActuatorCall::Scroll(-300))), 2);
    }

    #[test]
    fn unsupported_media_key_still_reports_the_label() {
        let mut d = dispatcher();
        let mut a = DryRunActuator::new(None);
        a.unsupported_keys.push("playpause".to_string());
        let out = d.dispatch(GestureLabel::ThumbsUp, 3.0, &mut a);
        assert_eq!(out.fired, GestureLabel::ThumbsUp);
        assert_eq!(out.action, Some(Action::PlayPause));
        assert!(a.calls.is_empty());
    }

    #[test]
    fn fist_requests_stop_only_when_ready() {
        let mut d = dispatcher();
        let mut a = DryRunActuator::new(None);
        d.dispatch(GestureLabel::ThumbsUp, 3.0, &mut a);
        assert!(!d.dispatch(GestureLabel::Fist, 3.5, &mut a).stop_requested);
        let out = d.dispatch(GestureLabel::Fist, 4.1, &mut a);
        assert!(out.stop_requested);
        assert_eq!(out.action, Some(Action::EmergencyStop));
    }
}
