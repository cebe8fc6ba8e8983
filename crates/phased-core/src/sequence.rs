//! Seeded input sequences
//!
//! The reduction treats its input as an opaque, read-only slice of `i32`.
//! This module produces such slices deterministically from a seed so that
//! parallel and serial runs can be compared over identical data.

use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

const LRAND48_A: u64 = 0x5_DEEC_E66D;
const LRAND48_C: u64 = 0xB;
const LRAND48_MASK: u64 = (1 << 48) - 1;

/// 48-bit linear congruential generator compatible with `srand48`/`lrand48`
///
/// Yields non-negative values in `[0, 2^31)`.
#[derive(Debug, Clone)]
pub struct Lrand48 {
    state: u64,
}

impl Lrand48 {
    /// Seed the generator; only the low 32 bits of `seed` are used
    pub fn new(seed: u64) -> Self {
        Self {
            state: ((seed & 0xFFFF_FFFF) << 16) | 0x330E,
        }
    }

    pub fn next_value(&mut self) -> i32 {
        self.state = LRAND48_A
            .wrapping_mul(self.state)
            .wrapping_add(LRAND48_C)
            & LRAND48_MASK;
        (self.state >> 17) as i32
    }
}

impl Iterator for Lrand48 {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        Some(self.next_value())
    }
}

/// Where sequence values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceSource {
    /// `srand48(seed)` followed by repeated `lrand48()`
    Lrand48 { seed: u64 },
    /// `StdRng::seed_from_u64(seed)`, uniform over `[0, 2^31)`
    StdRng { seed: u64 },
}

impl Default for SequenceSource {
    fn default() -> Self {
        Self::Lrand48 { seed: 0 }
    }
}

/// Immutable input sequence shared read-only by every worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    values: Vec<i32>,
}

impl Sequence {
    /// Generate `len` values from `source`
    pub fn generate(len: usize, source: SequenceSource) -> Result<Self> {
        if len == 0 {
            return Err(Error::empty_sequence());
        }
        let values = match source {
            SequenceSource::Lrand48 { seed } => Lrand48::new(seed).take(len).collect(),
            SequenceSource::StdRng { seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..len).map(|_| rng.gen_range(0..=i32::MAX)).collect()
            }
        };
        tracing::debug!(len, ?source, "generated input sequence");
        Ok(Self { values })
    }

    /// Wrap existing values
    pub fn from_vec(values: Vec<i32>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::empty_sequence());
        }
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.values
    }

    pub fn into_inner(self) -> Vec<i32> {
        self.values
    }
}

impl Deref for Sequence {
    type Target = [i32];

    fn deref(&self) -> &[i32] {
        &self.values
    }
}
