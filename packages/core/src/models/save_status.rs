//! Autosave status and retry bookkeeping
//!
//! `SaveStatus` is the value the editor header renders ("Saving...",
//! "Saved", "Failed - Retry"). Only the autosave session changes it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Persistence status of an editor's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// Nothing in flight; initial and resting state
    #[default]
    Idle,
    /// A write call is in flight
    Saving,
    /// The last write succeeded
    Saved,
    /// The last write failed; a manual retry may be offered
    Failed,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consecutive write failures for the current value, bounded by `max_attempts`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryState {
    pub attempts: u32,
    pub max_attempts: u32,
    /// True while a manual retry's write call is in flight; automatic writes
    /// after a settle leave it false
    pub in_flight: bool,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            in_flight: false,
        }
    }

    /// No further retry may be issued for the current value
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    pub fn record_failure(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
        self.in_flight = false;
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.in_flight = false;
    }
}

/// Everything the editor chrome needs to render save feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveSnapshot {
    pub status: SaveStatus,
    pub retry: RetryState,
    /// Character count of the latest edited value
    pub char_count: usize,
    /// Latest edited value equals the canonical empty document
    pub is_empty: bool,
}

impl AutosaveSnapshot {
    pub fn new(max_attempts: u32, char_count: usize, is_empty: bool) -> Self {
        Self {
            status: SaveStatus::Idle,
            retry: RetryState::new(max_attempts),
            char_count,
            is_empty,
        }
    }
}
