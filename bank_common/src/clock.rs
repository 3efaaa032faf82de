//! Time source for transaction timestamps

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// A source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// **A clock that only moves when told to**
///
/// Every call to `now` returns the current reading and then advances it by `step`,
/// which makes the ordering of recorded transactions predictable.
/// A zero `step` freezes time.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let reading = *current;
        *current = reading + self.step;
        reading
    }
}
