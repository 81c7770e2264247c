//! Periodic schedules on the simulator's clock.
//!
//! The simulator reports time in whole seconds. A task with period `p` fires
//! whenever the reported time is an exact multiple of `p`, including time 0.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period {
    secs: f64,
}

impl Period {
    /// A period of `0` (or less) never fires.
    pub fn from_secs(secs: f64) -> Self {
        Self { secs }
    }

    pub fn secs(self) -> f64 {
        self.secs
    }

    pub fn is_disabled(self) -> bool {
        !(self.secs > 0.0)
    }

    pub fn is_due(self, time: f64) -> bool {
        !self.is_disabled() && time % self.secs == 0.0
    }

    /// Index of the period that contains `time`.
    pub fn step(self, time: f64) -> usize {
        if self.is_disabled() || !(time > 0.0) {
            return 0;
        }
        (time / self.secs).floor() as usize
    }

    /// Number of whole periods in `horizon`.
    pub fn steps_within(self, horizon: f64) -> usize {
        if self.is_disabled() {
            return 0;
        }
        (horizon / self.secs).floor().max(0.0) as usize
    }
}
