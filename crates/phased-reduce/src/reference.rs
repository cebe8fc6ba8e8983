//! Single-threaded ground truth and the acceptance checks against it
//!
//! Summation order changes with the worker count, so a parallel result can
//! differ from the serial one in the last bits. Two acceptance policies are
//! offered: comparing floored values (what the command-line tool reports)
//! and a relative tolerance (what the tests use).

use crate::orchestrator::Summary;
use phased_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Population mean and standard deviation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub mean: f64,
    pub std_dev: f64,
}

/// Compute [`Moments`] of `values` on the calling thread
pub fn serial(values: &[i32]) -> Result<Moments> {
    if values.is_empty() {
        return Err(Error::empty_sequence());
    }
    let n = values.len() as f64;
    let sum: i64 = values.iter().map(|&v| i64::from(v)).sum();
    let mean = sum as f64 / n;
    let squared: f64 = values
        .iter()
        .map(|&v| {
            let d = f64::from(v) - mean;
            d * d
        })
        .sum();
    Ok(Moments {
        mean,
        std_dev: (squared / n).sqrt(),
    })
}

impl Summary {
    pub fn moments(&self) -> Moments {
        Moments {
            mean: self.mean,
            std_dev: self.std_dev,
        }
    }

    /// Integer parts of both statistics match the reference
    pub fn agrees_floored(&self, reference: &Moments) -> bool {
        self.mean_agrees_floored(reference) && self.std_dev_agrees_floored(reference)
    }

    pub fn mean_agrees_floored(&self, reference: &Moments) -> bool {
        self.mean.floor() == reference.mean.floor()
    }

    pub fn std_dev_agrees_floored(&self, reference: &Moments) -> bool {
        self.std_dev.floor() == reference.std_dev.floor()
    }

    /// Both statistics are within `rel_tol` of the reference
    pub fn agrees_within(&self, reference: &Moments, rel_tol: f64) -> bool {
        close(self.mean, reference.mean, rel_tol) && close(self.std_dev, reference.std_dev, rel_tol)
    }
}

fn close(actual: f64, expected: f64, rel_tol: f64) -> bool {
    let scale = actual.abs().max(expected.abs());
    (actual - expected).abs() <= rel_tol * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn summary(mean: f64, std_dev: f64) -> Summary {
        Summary {
            mean,
            std_dev,
            len: 1,
            workers: 1,
            mean_finalizer: 0,
            std_dev_finalizer: 0,
        }
    }

    #[test]
    fn test_serial_textbook_example() {
        let moments = serial(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        assert_relative_eq!(moments.mean, 5.0);
        assert_relative_eq!(moments.std_dev, 2.0);
    }

    #[test]
    fn test_serial_constant_sequence() {
        let moments = serial(&[7; 100]).unwrap();
        assert_relative_eq!(moments.mean, 7.0);
        assert_eq!(moments.std_dev, 0.0);
    }

    #[test]
    fn test_serial_empty() {
        assert!(serial(&[]).is_err());
    }

    #[test]
    fn test_floored_agreement() {
        let reference = Moments { mean: 10.2, std_dev: 3.9 };
        assert!(summary(10.9, 3.1).agrees_floored(&reference));
        assert!(!summary(11.0, 3.1).agrees_floored(&reference));
        assert!(summary(10.5, 4.0).mean_agrees_floored(&reference));
        assert!(!summary(10.5, 4.0).std_dev_agrees_floored(&reference));
    }

    #[test]
    fn test_relative_agreement() {
        let reference = Moments { mean: 1.0e9, std_dev: 6.0e8 };
        assert!(summary(1.0e9 + 1.0, 6.0e8 - 1.0).agrees_within(&reference, 1e-6));
        assert!(!summary(1.0e9 + 1.0e4, 6.0e8).agrees_within(&reference, 1e-6));
    }
}
