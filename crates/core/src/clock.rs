// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock abstraction for testable timestamps
//!
//! Set records are stamped with local wall-clock time, while deadlines and
//! journal entries use UTC. Both come from the same clock so a test can pin
//! them together.

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

/// A clock that provides the current wall time
pub trait Clock: Clone + Send + Sync + 'static {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;

    /// Current local date and time, used for set record timestamps
    fn local_now(&self) -> NaiveDateTime;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Fake clock for testing with controllable time
///
/// Local time and UTC are the same instant on a fake clock.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<NaiveDateTime>>,
}

impl FakeClock {
    /// Create a fake clock pinned at the given local time
    pub fn at(local: NaiveDateTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(local)),
        }
    }

    pub fn new() -> Self {
        Self::at(Utc::now().naive_utc())
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: std::time::Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += Duration::from_std(duration).unwrap_or(Duration::zero());
    }

    /// Set the clock to a specific local time
    pub fn set(&self, local: NaiveDateTime) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = local;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.local_now())
    }

    fn local_now(&self) -> NaiveDateTime {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
