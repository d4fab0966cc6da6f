//! Clocks for driving the daemon deterministically in tests.

use flurry::TimeSource;
use std::sync::{
    Arc,
    atomic::{AtomicI64, AtomicU64, Ordering},
};
use tokio::time::Instant;

/// A clock that advances with Tokio's (pausable) timer and can be stepped to
/// any reading, including backwards.
#[derive(Clone)]
pub struct SimClock {
    origin: Instant,
    base: Arc<AtomicI64>,
}

impl SimClock {
    pub fn at(millis: u64) -> Self {
        let clock = Self {
            origin: Instant::now(),
            base: Arc::new(AtomicI64::new(0)),
        };
        clock.set(millis);
        clock
    }

    /// Makes the clock read `millis` now.
    pub fn set(&self, millis: u64) {
        let elapsed = self.elapsed_millis();
        self.base.store(millis as i64 - elapsed, Ordering::Relaxed);
    }

    fn elapsed_millis(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}

impl TimeSource<u64> for SimClock {
    fn current_millis(&self) -> u64 {
        (self.base.load(Ordering::Relaxed) + self.elapsed_millis()) as u64
    }
}

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn at(millis: u64) -> Self {
        Self(Arc::new(AtomicU64::new(millis)))
    }

    pub fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::Relaxed);
    }
}

impl TimeSource<u64> for ManualClock {
    fn current_millis(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
