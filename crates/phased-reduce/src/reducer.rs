//! Per-worker partial statistics over one partition

use phased_core::{Error, Partition, Result};

/// Computes a worker's contribution to each phase
#[derive(Debug, Clone, Copy)]
pub struct LocalReducer<'a> {
    block: &'a [i32],
    partition: Partition,
}

impl<'a> LocalReducer<'a> {
    /// Bind a reducer to `values[partition]`
    pub fn new(values: &'a [i32], partition: Partition) -> Result<Self> {
        let block = values.get(partition.range()).ok_or_else(|| {
            Error::size_mismatch(partition.end(), values.len(), "local reducer partition")
        })?;
        Ok(Self { block, partition })
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Phase 1: sum of the block
    ///
    /// `i64` holds any sum of up to 2^32 non-negative `i32` values.
    pub fn sum(&self) -> i64 {
        self.block.iter().map(|&v| i64::from(v)).sum()
    }

    /// Phase 2: sum of squared deviations of the block from `mean`
    pub fn squared_deviations(&self, mean: f64) -> f64 {
        self.block
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sum_covers_only_the_block() {
        let values = [1, 2, 3, 4, 5, 6, 7];
        let p = Partition::for_worker(values.len(), 3, 1).unwrap();
        let reducer = LocalReducer::new(&values, p).unwrap();
        assert_eq!(reducer.sum(), 3 + 4);
    }

    #[test]
    fn test_sum_does_not_overflow_i32() {
        let values = [i32::MAX; 4];
        let p = Partition::for_worker(4, 1, 0).unwrap();
        assert_eq!(LocalReducer::new(&values, p).unwrap().sum(), 4 * i64::from(i32::MAX));
    }

    #[test]
    fn test_squared_deviations() {
        let values = [2, 4, 4, 4, 5, 5, 7, 9];
        let p = Partition::for_worker(values.len(), 1, 0).unwrap();
        let reducer = LocalReducer::new(&values, p).unwrap();
        assert_relative_eq!(reducer.squared_deviations(5.0), 32.0);
    }

    #[test]
    fn test_partition_outside_values_rejected() {
        let values = [1, 2, 3];
        let p = Partition::for_worker(10, 2, 1).unwrap();
        assert!(LocalReducer::new(&values, p).is_err());
    }
}
