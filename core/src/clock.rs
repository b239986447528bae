//! Wall clock for `recorded_at` stamps.
//!
//! The desk never reads the system time directly; it asks a `Clock`.
//! Tests pin time with `FixedClock`.

use chrono::{Local, NaiveDateTime, Timelike};

pub trait Clock {
    /// Current local time, truncated to whole seconds.
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
