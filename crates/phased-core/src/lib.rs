//! Core types for barrier-synchronized parallel statistics
//!
//! This crate holds the pieces every other phased-stats crate agrees on:
//!
//! - [`Error`] / [`Result`]: the shared error type
//! - [`ReductionConfig`]: pre-flight limits checked before threads exist
//! - [`Partition`] / [`partition`]: contiguous block assignment per worker
//! - [`Sequence`]: the read-only input, generated from a seed
//!
//! # Example
//!
//! ```rust
//! use phased_core::{partition, Sequence, SequenceSource};
//!
//! let seq = Sequence::generate(10, SequenceSource::Lrand48 { seed: 0 }).unwrap();
//! let blocks = partition(seq.len(), 3).unwrap();
//! assert_eq!(blocks[2].range(), 6..10);
//! ```

pub mod config;
pub mod error;
pub mod partition;
pub mod sequence;

pub use config::{ReductionConfig, DEFAULT_MAX_LEN, DEFAULT_MAX_THREADS};
pub use error::{Error, Result};
pub use partition::{partition, Partition};
pub use sequence::{Lrand48, Sequence, SequenceSource};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
