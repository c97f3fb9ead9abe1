use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of the two clocks the autosave core reads: a monotonic seconds counter for the
/// scheduler window and a local wall clock for backup file names.
pub trait Clock {
    /// Seconds since the clock started. Never decreases.
    fn monotonic_seconds(&self) -> f64;

    /// Local wall time used to stamp backup artifacts.
    fn wall_time(&self) -> NaiveDateTime;
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic_seconds(&self) -> f64 {
        Instant::now().duration_since(self.start).as_secs_f64()
    }

    fn wall_time(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Hand-driven clock. Clones share the same counter so a test can keep one handle and give
/// another to the controller.
#[derive(Clone)]
pub struct ManualClock {
    seconds: Rc<Cell<f64>>,
    epoch: NaiveDateTime,
}

impl ManualClock {
    pub fn new(epoch: NaiveDateTime) -> Self {
        Self { seconds: Rc::new(Cell::new(0.0)), epoch }
    }

    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            self.seconds.set(self.seconds.get() + seconds);
        }
    }

    pub fn set(&self, seconds: f64) {
        if seconds >= self.seconds.get() {
            self.seconds.set(seconds);
        }
    }
}

impl Clock for ManualClock {
    fn monotonic_seconds(&self) -> f64 {
        self.seconds.get()
    }

    fn wall_time(&self) -> NaiveDateTime {
        let millis = (self.seconds.get() * 1000.0).round() as i64;
        self.epoch + ChronoDuration::milliseconds(millis)
    }
}
