//! Convergence timer: when enforcement started waiting, and for how long it
//! may wait.

use std::time::Duration;

use o2ims_core::Timestamp;

/// Tracks the start of the current non-compliance window.
///
/// An unset `non_compliant_at` means no window is open and the timeout
/// guard can never fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceTimer {
    non_compliant_at: Option<Timestamp>,
    timeout: Duration,
}

impl ConvergenceTimer {
    /// An unset timer with the given convergence timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            non_compliant_at: None,
            timeout,
        }
    }

    /// Rehydrate a timer from a persisted start instant.
    pub fn with_start(timeout: Duration, non_compliant_at: Option<Timestamp>) -> Self {
        Self {
            non_compliant_at,
            timeout,
        }
    }

    /// Close the window.
    pub fn reset(&mut self) {
        self.non_compliant_at = None;
    }

    /// Whether no window is open.
    pub fn is_reset(&self) -> bool {
        self.non_compliant_at.is_none()
    }

    /// (Re)open the window at `now`.
    pub fn start(&mut self, now: Timestamp) {
        self.non_compliant_at = Some(now);
    }

    /// Start of the open window, if any.
    pub fn non_compliant_at(&self) -> Option<Timestamp> {
        self.non_compliant_at
    }

    /// The configured convergence timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A window is open and strictly more than `timeout` has elapsed.
    pub fn is_timed_out(&self, now: Timestamp) -> bool {
        self.elapsed(now)
            .is_some_and(|elapsed| elapsed > self.timeout)
    }

    /// Time left before [`is_timed_out`](Self::is_timed_out) turns true.
    ///
    /// `None` when no window is open. Zero once the timeout has been
    /// reached.
    pub fn remaining(&self, now: Timestamp) -> Option<Duration> {
        let start = self.non_compliant_at?;
        let elapsed = now.elapsed_since(&start).unwrap_or(Duration::ZERO);
        Some(self.timeout.saturating_sub(elapsed))
    }

    fn elapsed(&self, now: Timestamp) -> Option<Duration> {
        now.elapsed_since(&self.non_compliant_at?)
    }
}
