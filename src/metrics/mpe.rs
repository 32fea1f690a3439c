//! Mean pixel error: average absolute luma difference. Lower is better.

use super::{ensure_same_dimensions, MetricEvaluator, Polarity};
use crate::error::Result;
use crate::plane::LumaPlane;

pub struct MeanPixelError;

impl MetricEvaluator for MeanPixelError {
    fn name(&self) -> &'static str {
        "mpe"
    }

    fn polarity(&self) -> Polarity {
        Polarity::LowerIsBetter
    }

    fn score(&self, original: &LumaPlane, candidate: &LumaPlane) -> Result<f64> {
        ensure_same_dimensions(original, candidate)?;
        let total: u64 = original
            .as_slice()
            .iter()
            .zip(candidate.as_slice())
            .map(|(&a, &b)| a.abs_diff(b) as u64)
            .sum();
        Ok(total as f64 / original.as_slice().len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_absolute_difference() {
        let a = LumaPlane::new(2, 2, vec![10, 20, 30, 40]).unwrap();
        let b = LumaPlane::new(2, 2, vec![12, 18, 30, 44]).unwrap();
        assert_eq!(MeanPixelError.score(&a, &b).unwrap(), 2.0);
        assert_eq!(MeanPixelError.score(&a, &a).unwrap(), 0.0);
    }
}
