//! Finalization of accumulated partials into published statistics

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two reduction phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Sum of values, published as the mean
    Mean,
    /// Sum of squared deviations, published as the standard deviation
    StdDev,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Mean => write!(f, "mean"),
            Phase::StdDev => write!(f, "std_dev"),
        }
    }
}

/// Turns a phase's fully folded accumulator into its published value
///
/// Both statistics are population statistics over the whole sequence,
/// so the divisor is the sequence length rather than `len - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalAggregator {
    len: usize,
}

impl GlobalAggregator {
    pub fn new(len: usize) -> Self {
        Self { len }
    }

    pub fn mean(&self, sum: i64) -> f64 {
        sum as f64 / self.len as f64
    }

    pub fn std_dev(&self, squared_deviations: f64) -> f64 {
        (squared_deviations / self.len as f64).sqrt()
    }
}
