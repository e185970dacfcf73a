// Time Provider Port (for measuring call durations deterministically in tests)

/// Monotonic-enough wall clock in milliseconds since epoch
pub trait TimeProvider: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::TimeProvider;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock that advances by a fixed step on every read
    pub struct SteppingTimeProvider {
        next: AtomicI64,
        step_ms: i64,
    }

    impl SteppingTimeProvider {
        pub fn new(start_ms: i64, step_ms: i64) -> Self {
            Self {
                next: AtomicI64::new(start_ms),
                step_ms,
            }
        }
    }

    impl TimeProvider for SteppingTimeProvider {
        fn now_millis(&self) -> i64 {
            self.next.fetch_add(self.step_ms, Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::SteppingTimeProvider;
    use super::*;

    #[test]
    fn test_stepping_provider_advances() {
        let clock = SteppingTimeProvider::new(1000, 250);
        assert_eq!(clock.now_millis(), 1000);
        assert_eq!(clock.now_millis(), 1250);
    }
}
