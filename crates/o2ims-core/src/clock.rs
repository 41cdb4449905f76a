//! # Clock Abstraction
//!
//! Anything that decides based on elapsed time reads "now" through a
//! [`Clock`] so the decision can be replayed deterministically.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::temporal::Timestamp;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current UTC instant.
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

/// A clock that only moves when told to.
///
/// Clones share the same instant: advancing one handle advances every
/// engine holding a clone.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Jump to `ts`. Moving backwards is allowed.
    pub fn set(&self, ts: Timestamp) {
        *self.now.lock() = ts;
    }

    /// Move forward by `duration`. Saturates at the current instant on
    /// overflow.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock();
        if let Some(next) = now.checked_add(duration) {
            *now = next;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
