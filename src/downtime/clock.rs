//! Time sources for downtime bookkeeping.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Wall-clock source used by the registry for start and end instants.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(at) }
    }

    pub fn advance(&self, secs: i64) {
        let mut now = self.now.lock();
        *now += Duration::seconds(secs);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
