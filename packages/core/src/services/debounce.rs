//! Trailing-edge debounce primitive
//!
//! Each autosave coordinator owns one `Debouncer`; there is no shared timer.
//! Values pushed within the quiescence window replace each other and move the
//! deadline, and only the latest value is released once the window elapses
//! without a new push. There is no leading-edge fire.
//!
//! The debouncer holds no task or timer itself. The owner sleeps until
//! [`Debouncer::deadline`] and then calls [`Debouncer::take_ready`]. Times are
//! `tokio::time::Instant`, so paused virtual time drives it in tests.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record `value` as observed now
    pub fn push(&mut self, value: T) {
        self.push_at(value, Instant::now());
    }

    /// Record `value` as observed at `at`, superseding any pending value
    ///
    /// The deadline never moves backwards, so an out-of-order timestamp cannot
    /// shorten the window of a later event.
    pub fn push_at(&mut self, value: T, at: Instant) {
        let candidate = at + self.window;
        self.deadline = Some(match self.deadline {
            Some(current) if current > candidate => current,
            _ => candidate,
        });
        self.pending = Some(value);
    }

    /// When the pending value becomes ready, if any is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the pending value if its window elapsed by `now`
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.flush(),
            _ => None,
        }
    }

    /// Release the pending value immediately
    pub fn flush(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }
}
