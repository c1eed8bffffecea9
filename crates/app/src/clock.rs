//! Wall clock abstraction.

use std::fmt::Debug;

use jiff::Timestamp;

/// Source of "now" in milliseconds since the Unix epoch.
pub trait Clock: Debug + Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Timestamp::now().as_millisecond()
    }
}

#[cfg(test)]
pub(crate) use fixed::FixedClock;

#[cfg(test)]
mod fixed {
    use std::sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    };

    use super::Clock;

    /// Manually advanced clock for expiry tests.
    #[derive(Debug, Clone)]
    pub(crate) struct FixedClock {
        now: Arc<AtomicI64>,
    }

    impl FixedClock {
        pub(crate) fn new(now_ms: i64) -> Self {
            Self {
                now: Arc::new(AtomicI64::new(now_ms)),
            }
        }

        pub(crate) fn advance_ms(&self, delta: i64) {
            self.now.fetch_add(delta, Ordering::SeqCst);
        }
    }

    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}
