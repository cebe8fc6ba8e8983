//! Shared utilities for integration tests

#![allow(dead_code)]

use phased_core::{Sequence, SequenceSource};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use approx::assert_relative_eq;

pub const REL_TOL: f64 = 1e-6;

/// The sequence used by the reference run: `srand48(0)`, one million values
pub fn reference_sequence() -> Sequence {
    Sequence::generate(1_000_000, SequenceSource::Lrand48 { seed: 0 }).unwrap()
}

/// Small-valued data with an awkward length for partition remainders
pub fn generate_test_data(len: usize, seed: u64) -> Vec<i32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-1_000..=1_000)).collect()
}

/// Thread counts that exercise even splits, remainders and oversubscription
pub fn thread_counts() -> Vec<usize> {
    vec![1, 2, 3, 4, 7, 8, 9, 16, 33, 64]
}
