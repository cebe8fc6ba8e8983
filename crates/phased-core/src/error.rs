//! Error types for barrier-synchronized statistics
//!
//! Provides a unified error type for all phased-stats crates.

use thiserror::Error;

/// Core error type for phased reduction operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested worker count exceeds the configured maximum
    #[error("Maximum number of threads allowed: {max} (requested {requested})")]
    TooManyThreads { requested: usize, max: usize },

    /// Requested sequence length exceeds the configured maximum
    #[error("Maximum list size allowed: {max} (requested {requested})")]
    SequenceTooLong { requested: usize, max: usize },

    /// More workers than elements to hand out
    #[error("Number of threads ({threads}) < list_size ({len}) not allowed")]
    ThreadsExceedLength { threads: usize, len: usize },

    /// A barrier was abandoned before every participant arrived
    #[error("Barrier broken: {0}")]
    BarrierBroken(String),

    /// Threading error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Config error: {0}")]
    Config(String),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for an empty sequence
    pub fn empty_sequence() -> Self {
        Self::InvalidInput("sequence must contain at least one element".to_string())
    }

    /// Create an error for a zero worker count
    pub fn no_workers() -> Self {
        Self::InvalidParameter("worker count must be at least 1".to_string())
    }

    /// Create an error for a worker index outside `[0, workers)`
    pub fn worker_out_of_range(worker: usize, workers: usize) -> Self {
        Self::InvalidParameter(format!(
            "worker index {worker} out of range for {workers} workers"
        ))
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// True for errors raised by pre-flight validation, before any thread exists
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter(_)
                | Self::InvalidInput(_)
                | Self::TooManyThreads { .. }
                | Self::SequenceTooLong { .. }
                | Self::ThreadsExceedLength { .. }
        )
    }
}
