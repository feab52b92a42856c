//! Elapsed-time track for one ripple
//!
//! Jumps to 0 when restarted, then rises linearly to the duration and holds
//! there until the next restart.

/// Keyframed elapsed time driven by the host clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElapsedTime {
    /// Host time (seconds) of the last restart
    started_at: f64,
    /// Value the track rises to and then holds
    duration: f32,
}

impl ElapsedTime {
    pub fn new(duration: f32) -> Self {
        Self {
            started_at: f64::NEG_INFINITY,
            duration: duration.max(0.0),
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Begin a new run at host time `now`
    pub fn restart(&mut self, now: f64) {
        self.started_at = now;
    }

    /// Whether the track has ever been started
    pub fn is_started(&self) -> bool {
        self.started_at.is_finite()
    }

    /// Value at host time `now`
    ///
    /// Before the first restart the track rests at its end value.
    pub fn value_at(&self, now: f64) -> f32 {
        if !self.is_started() {
            return self.duration;
        }
        let since = ((now - self.started_at).max(0.0)) as f32;
        since.min(self.duration)
    }
}
