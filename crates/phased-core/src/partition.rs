//! Contiguous block partitioning of a sequence across workers
//!
//! Every worker receives `len / workers` elements; the remainder is folded
//! entirely into the last worker's block rather than spread evenly. The
//! layout depends only on `(len, workers)`, so any number of threads can
//! derive their own block independently and agree on the result.

use crate::{Error, Result};
use std::ops::Range;

/// Half-open index range `[start, end)` owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    start: usize,
    end: usize,
}

impl Partition {
    /// Compute the block assigned to `worker` out of `workers`
    ///
    /// Requires `1 <= workers <= len` and `worker < workers`.
    pub fn for_worker(len: usize, workers: usize, worker: usize) -> Result<Self> {
        check_layout(len, workers)?;
        if worker >= workers {
            return Err(Error::worker_out_of_range(worker, workers));
        }
        Ok(Self::unchecked(len, workers, worker))
    }

    fn unchecked(len: usize, workers: usize, worker: usize) -> Self {
        let block = len / workers;
        let start = worker * block;
        let end = if worker == workers - 1 {
            len
        } else {
            start + block
        };
        Self { start, end }
    }

    /// First index of the block
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last index of the block
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of elements in the block
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The block as a slice index range
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `[0, len)` into `workers` contiguous blocks
pub fn partition(len: usize, workers: usize) -> Result<Vec<Partition>> {
    check_layout(len, workers)?;
    Ok((0..workers)
        .map(|worker| Partition::unchecked(len, workers, worker))
        .collect())
}

fn check_layout(len: usize, workers: usize) -> Result<()> {
    if workers == 0 {
        return Err(Error::no_workers());
    }
    if len == 0 {
        return Err(Error::empty_sequence());
    }
    if workers > len {
        return Err(Error::ThreadsExceedLength { threads: workers, len });
    }
    Ok(())
}
