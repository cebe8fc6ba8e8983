//! Barrier-synchronized parallel statistics
//!
//! Facade over the phased-stats workspace:
//!
//! - [`phased_core`]: errors, configuration, partitioning and input sequences
//! - [`phased_barrier`]: the generation-tagged folding barrier
//! - [`phased_reduce`]: the two-phase mean / standard deviation reduction
//!
//! # Example
//!
//! ```rust
//! use phased_stats::prelude::*;
//!
//! let seq = Sequence::generate(1_000, SequenceSource::Lrand48 { seed: 0 }).unwrap();
//! let summary = Orchestrator::new(ReductionConfig::default()).run(&seq, 3).unwrap();
//! assert!(summary.std_dev > 0.0);
//! ```

pub use phased_barrier;
pub use phased_core;
pub use phased_reduce;

pub use phased_core::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use phased_barrier::{Arrival, PhaseBarrier};
    pub use phased_core::{
        partition, Error, Partition, ReductionConfig, Result, Sequence, SequenceSource,
    };
    pub use phased_reduce::{
        reference, GlobalAggregator, LocalReducer, Moments, Orchestrator, Summary,
    };
}
