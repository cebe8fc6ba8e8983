//! Limits and tuning knobs for a reduction run

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest sequence accepted by default (2^28 elements)
pub const DEFAULT_MAX_LEN: usize = 268_435_456;

/// Largest worker count accepted by default
pub const DEFAULT_MAX_THREADS: usize = 65_536;

/// Pre-flight limits checked before any worker thread is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionConfig {
    /// Maximum accepted sequence length
    pub max_len: usize,
    /// Maximum accepted worker count
    pub max_threads: usize,
    /// How long a worker may wait at a barrier before the run is abandoned.
    /// `None` waits forever.
    pub wait_timeout_ms: Option<u64>,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            max_threads: DEFAULT_MAX_THREADS,
            wait_timeout_ms: None,
        }
    }
}

impl ReductionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Barrier wait timeout, if one is configured
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Check a `(len, threads)` request against the limits
    ///
    /// Checks run in a fixed order: length limit, thread limit, then
    /// `threads <= len`.
    pub fn validate(&self, len: usize, threads: usize) -> Result<()> {
        if len > self.max_len {
            return Err(Error::SequenceTooLong {
                requested: len,
                max: self.max_len,
            });
        }
        if threads > self.max_threads {
            return Err(Error::TooManyThreads {
                requested: threads,
                max: self.max_threads,
            });
        }
        if threads == 0 {
            return Err(Error::no_workers());
        }
        if len == 0 {
            return Err(Error::empty_sequence());
        }
        if threads > len {
            return Err(Error::ThreadsExceedLength { threads, len });
        }
        Ok(())
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.check_limits()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn check_limits(&self) -> Result<()> {
        if self.max_len == 0 || self.max_threads == 0 {
            return Err(Error::Config(
                "max_len and max_threads must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
