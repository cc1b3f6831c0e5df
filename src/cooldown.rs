/// Minimum spacing between firings of one action class.
///
/// Timestamps are seconds on the session clock. A timer that has never
/// fired is always ready.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownTimer {
    last_fire: Option<f64>,
    min_interval: f64,
}

impl CooldownTimer {
    pub fn new(min_interval: f64) -> Self {
        Self {
            last_fire: None,
            min_interval,
        }
    }

    pub fn min_interval(&self) -> f64 {
        self.min_interval
    }

    pub fn last_fire(&self) -> Option<f64> {
        self.last_fire
    }

    /// Strictly more than `min_interval` must have elapsed.
    pub fn ready(&self, now: f64) -> bool {
        match self.last_fire {
            Some(last) => now - last > self.min_interval,
            None => true,
        }
    }

    pub fn stamp(&mut self, at: f64) {
        self.last_fire = Some(at);
    }

    /// Stamps and returns true when ready, otherwise leaves the timer alone.
    pub fn try_fire(&mut self, now: f64) -> bool {
        if self.ready(now) {
            self.stamp(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last_fire = None;
    }
}
