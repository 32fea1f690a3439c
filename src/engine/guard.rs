// src/engine/guard.rs
//
// Post-search size policy. One guard per output variant.

/// Outcome of a size check. `total` is what the assembled output would weigh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeVerdict {
    Accept { total: u64 },
    Reject { total: u64 },
}

impl SizeVerdict {
    pub fn total(&self) -> u64 {
        match *self {
            SizeVerdict::Accept { total } | SizeVerdict::Reject { total } => total,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, SizeVerdict::Accept { .. })
    }
}

pub trait SizeGuard {
    fn evaluate(&self, candidate_len: u64, metadata_len: u64, original_len: u64) -> SizeVerdict;
}

/// Re-encode guard: the output has to beat the original by `min_delta` bytes
/// once the signature segment and carried metadata are added back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimumSavings {
    pub marker_overhead: u64,
    pub min_delta: u64,
}

impl SizeGuard for MinimumSavings {
    fn evaluate(&self, candidate_len: u64, metadata_len: u64, original_len: u64) -> SizeVerdict {
        let total = candidate_len + self.marker_overhead + metadata_len;
        if total + self.min_delta >= original_len {
            SizeVerdict::Reject { total }
        } else {
            SizeVerdict::Accept { total }
        }
    }
}

/// Conversion guard: a different format is the point, so any size goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unconditional;

impl SizeGuard for Unconditional {
    fn evaluate(&self, candidate_len: u64, metadata_len: u64, _original_len: u64) -> SizeVerdict {
        SizeVerdict::Accept {
            total: candidate_len + metadata_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUARD: MinimumSavings = MinimumSavings {
        marker_overhead: 33,
        min_delta: 10,
    };

    #[test]
    fn test_minimum_savings_boundary() {
        // 900 + 33 + 57 = 990; 990 + 10 == 1000 is not enough
        assert_eq!(
            GUARD.evaluate(900, 57, 1000),
            SizeVerdict::Reject { total: 990 }
        );
        assert_eq!(
            GUARD.evaluate(900, 57, 1001),
            SizeVerdict::Accept { total: 990 }
        );
    }

    #[test]
    fn test_larger_output_is_rejected() {
        assert!(!GUARD.evaluate(5000, 0, 1000).is_accepted());
        assert_eq!(GUARD.evaluate(5000, 0, 1000).total(), 5033);
    }

    #[test]
    fn test_unconditional_accepts_growth() {
        let verdict = Unconditional.evaluate(5000, 0, 10);
        assert!(verdict.is_accepted());
        assert_eq!(verdict.total(), 5000);
    }
}
