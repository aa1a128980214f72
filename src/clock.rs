//! Time source for the engine.
//!
//! Every time-window decision reads "now" through [`Clock`], so tests can pin
//! or advance the instant deterministically instead of sleeping.

use jiff::Timestamp;

/// Provides the current instant.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock pinned to an explicit instant.
///
/// Cloning shares the underlying instant: advancing one handle advances every
/// clone, so a test can hold a handle while the engine owns another.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedClock(std::sync::Arc<std::sync::Mutex<Timestamp>>);

#[cfg(test)]
impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self(std::sync::Arc::new(std::sync::Mutex::new(now)))
    }

    pub fn set(&self, now: Timestamp) {
        *self.0.lock().unwrap() = now;
    }

    pub fn advance(&self, by: jiff::SignedDuration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.0.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::SignedDuration;

    #[test]
    fn fixed_clock_shares_instant_across_clones() {
        let clock = FixedClock::new("2026-03-02T09:00:00Z".parse().unwrap());
        let handle = clock.clone();

        handle.advance(SignedDuration::from_mins(45));
        assert_eq!(clock.now(), "2026-03-02T09:45:00Z".parse().unwrap());

        handle.set("2026-03-02T12:00:00Z".parse().unwrap());
        assert_eq!(clock.now(), "2026-03-02T12:00:00Z".parse().unwrap());
    }
}
