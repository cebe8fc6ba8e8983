//! Generation-tagged rendezvous barrier with result exchange
//!
//! [`PhaseBarrier`] combines a lock-protected accumulator, an arrival
//! counter and a condition variable behind a single `enter` call. Exactly
//! one participant per phase (the last to arrive) runs the finalizer, and
//! every participant leaves with the value it published.
//!
//! # Example
//!
//! ```rust
//! use phased_barrier::PhaseBarrier;
//! use std::thread;
//!
//! let barrier: PhaseBarrier<i64, f64> = PhaseBarrier::new(3).unwrap();
//! let means: Vec<f64> = thread::scope(|s| {
//!     let handles: Vec<_> = [6_i64, 9, 15]
//!         .into_iter()
//!         .map(|partial| {
//!             let barrier = &barrier;
//!             s.spawn(move || barrier.enter(partial, |sum| sum as f64 / 3.0).published)
//!         })
//!         .collect();
//!     handles.into_iter().map(|h| h.join().unwrap()).collect()
//! });
//! assert!(means.iter().all(|&m| m == 10.0));
//! ```

mod barrier;

pub use barrier::{Arrival, PhaseBarrier};
