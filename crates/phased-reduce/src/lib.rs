//! Two-phase barrier-synchronized mean and standard deviation
//!
//! A fixed set of worker threads each own a contiguous block of the input.
//! They meet twice:
//!
//! 1. at the mean barrier, where block sums are folded and the last arrival
//!    publishes the mean;
//! 2. at the standard deviation barrier, where block sums of squared
//!    deviations from that mean are folded and the last arrival publishes
//!    the standard deviation.
//!
//! No worker starts its second pass before the mean is published, and the
//! mean is only published once every block sum has been folded.
//!
//! # Example
//!
//! ```rust
//! use phased_core::{ReductionConfig, Sequence, SequenceSource};
//! use phased_reduce::{reference, Orchestrator};
//!
//! let seq = Sequence::generate(10_000, SequenceSource::Lrand48 { seed: 0 }).unwrap();
//! let orchestrator = Orchestrator::new(ReductionConfig::default());
//! let summary = orchestrator.run(&seq, 4).unwrap();
//!
//! let expected = reference::serial(&seq).unwrap();
//! assert!(summary.agrees_within(&expected, 1e-9));
//! ```

pub mod aggregate;
pub mod events;
pub mod orchestrator;
pub mod reducer;
pub mod reference;

pub use aggregate::{GlobalAggregator, Phase};
pub use events::{EventBus, EventHandler, LoggingHandler, RecordingHandler, ReductionEvent};
pub use orchestrator::{Orchestrator, RunReport, Summary, WorkerReport};
pub use reducer::LocalReducer;
pub use reference::Moments;
