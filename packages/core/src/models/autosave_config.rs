//! Autosave configuration
//!
//! Values come from `Default`, a deserialised settings block, or the
//! environment (`APPSDIR_AUTOSAVE_DEBOUNCE_MS`, `APPSDIR_AUTOSAVE_MAX_RETRIES`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default quiescence window before a save (milliseconds)
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Default bound on consecutive failed writes for one value
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

pub const DEBOUNCE_ENV_VAR: &str = "APPSDIR_AUTOSAVE_DEBOUNCE_MS";
pub const MAX_RETRIES_ENV_VAR: &str = "APPSDIR_AUTOSAVE_MAX_RETRIES";

/// Configuration for an autosave coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutosaveConfig {
    /// Debounce window in milliseconds (default: 1000)
    pub debounce_ms: u64,
    /// Maximum consecutive write failures before retries are refused (default: 3)
    pub max_retry_attempts: u32,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
        }
    }
}

impl AutosaveConfig {
    pub fn new(debounce_ms: u64, max_retry_attempts: u32) -> Self {
        Self {
            debounce_ms,
            max_retry_attempts,
        }
    }

    /// Defaults overridden by environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(DEBOUNCE_ENV_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.debounce_ms = ms,
                Err(e) => tracing::warn!("Ignoring {}={:?}: {}", DEBOUNCE_ENV_VAR, raw, e),
            }
        }

        if let Some(raw) = lookup(MAX_RETRIES_ENV_VAR) {
            match raw.trim().parse::<u32>() {
                Ok(n) => config.max_retry_attempts = n,
                Err(e) => tracing::warn!("Ignoring {}={:?}: {}", MAX_RETRIES_ENV_VAR, raw, e),
            }
        }

        config
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Reject configurations the coordinator cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.debounce_ms == 0 {
            return Err("debounce window must be greater than zero".to_string());
        }
        if self.max_retry_attempts == 0 {
            return Err("max retry attempts must be at least one".to_string());
        }
        Ok(())
    }
}
