//! Clock sources for the tracker
//!
//! The tracker never reads the system clock directly. It asks a [`Clock`]
//! for nanoseconds since tracking started, so the same tracking logic runs
//! against a real monotonic clock inside a compiler and against a manually
//! advanced clock when replaying an event log.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::span::TimeStamp;

/// Source of monotonic nanoseconds since tracking started
pub trait Clock {
    fn now(&self) -> TimeStamp;
}

/// Real monotonic clock anchored at construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start counting from now
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> TimeStamp {
        // u64 nanoseconds covers ~584 years
        self.origin.elapsed().as_nanos() as TimeStamp
    }
}

/// Manually driven clock
///
/// Clones share the same reading, so a driver can keep one handle and
/// advance it while the tracking context owns another.
///
/// # Example
///
/// ```
/// use externis::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.set(42);
/// assert_eq!(clock.now(), 42);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    reading: Rc<Cell<TimeStamp>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock to `ns`
    ///
    /// Going backwards is ignored so the clock stays monotonic. Returns
    /// `false` when `ns` was earlier than the current reading.
    pub fn set(&self, ns: TimeStamp) -> bool {
        let current = self.reading.get();
        if ns >= current {
            self.reading.set(ns);
            true
        } else {
            false
        }
    }

    pub fn advance(&self, delta: TimeStamp) {
        self.reading.set(self.reading.get().saturating_add(delta));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeStamp {
        self.reading.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_never_decreases() {
        let clock = MonotonicClock::start();
        let t1 = clock.now();
        let t2 = clock.now();
        assert!(t2 >= t1);
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let driver = clock.clone();
        driver.advance(10);
        driver.advance(5);
        assert_eq!(clock.now(), 15);
    }

    #[test]
    fn test_manual_clock_ignores_rewind() {
        let clock = ManualClock::new();
        assert!(clock.set(100));
        assert!(!clock.set(40));
        assert_eq!(clock.now(), 100);
        assert!(clock.set(100));
    }
}
