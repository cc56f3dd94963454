//! Sleep abstraction for the settle pause between clear commands.

use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Trait for blocking pauses.
pub trait Sleeper: Send + Sync {
    fn pause(&self, duration: Duration);
}

/// Real sleeper that uses `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSleeper;

impl Sleeper for RealSleeper {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Mock sleeper that returns immediately and records requested pauses.
/// Cloning creates a new handle to the same record.
#[derive(Debug, Clone, Default)]
pub struct MockSleeper {
    pauses: Arc<RwLock<Vec<Duration>>>,
}

impl MockSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pauses requested so far, in order.
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.read().unwrap().clone()
    }
}

impl Sleeper for MockSleeper {
    fn pause(&self, duration: Duration) {
        self.pauses.write().unwrap().push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_mock_sleeper_returns_immediately() {
        let sleeper = MockSleeper::new();
        let start = Instant::now();
        sleeper.pause(Duration::from_secs(100));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_mock_sleeper_records_pauses() {
        let sleeper = MockSleeper::new();
        sleeper.pause(Duration::from_millis(500));
        sleeper.pause(Duration::from_millis(250));

        assert_eq!(
            sleeper.pauses(),
            vec![Duration::from_millis(500), Duration::from_millis(250)]
        );
    }

    #[test]
    fn test_real_sleeper_blocks() {
        let start = Instant::now();
        RealSleeper.pause(Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_sleeper_trait_object() {
        let sleeper: Box<dyn Sleeper> = Box::new(MockSleeper::new());
        sleeper.pause(Duration::from_millis(1));
    }
}
