//! Time source for entry expiry.
//!
//! Production caches use [`SystemClock`]. Tests drive expiry with
//! [`MockClock`], available in test builds or with the `test-helpers` feature.

use std::fmt::Debug;
use std::time::Instant;

/// Port for obtaining the current time.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockClock;

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use super::Clock;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    /// Manually advanced clock. Clones share the same time.
    #[derive(Debug, Clone)]
    pub struct MockClock {
        current: Arc<Mutex<Instant>>,
    }

    impl MockClock {
        pub fn new(start: Instant) -> Self {
            Self {
                current: Arc::new(Mutex::new(start)),
            }
        }

        pub fn advance(&self, duration: Duration) {
            let mut time = self.current.lock().expect("MockClock mutex poisoned");
            *time += duration;
        }

        pub fn set(&self, instant: Instant) {
            *self.current.lock().expect("MockClock mutex poisoned") = instant;
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new(Instant::now())
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.current.lock().expect("MockClock mutex poisoned")
        }
    }
}
