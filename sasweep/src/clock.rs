//! Clock abstraction for run timestamps.

use chrono::{DateTime, Utc};

/// Trait for getting the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for testing with a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    instant: DateTime<Utc>,
}

impl MockClock {
    /// Create a mock clock fixed at `instant`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Create a mock clock fixed at a Unix timestamp (seconds).
    pub fn from_unix_sec(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self::new)
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_returns_fixed_instant() {
        let clock = MockClock::from_unix_sec(1_700_000_000).expect("valid timestamp");
        assert_eq!(clock.now().timestamp(), 1_700_000_000);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01
        assert!(SystemClock.now().timestamp() > 1_577_836_800);
    }

    #[test]
    fn test_clock_trait_object() {
        let clock: Box<dyn Clock> = Box::new(MockClock::from_unix_sec(42).expect("valid"));
        assert_eq!(clock.now().timestamp(), 42);
    }
}
