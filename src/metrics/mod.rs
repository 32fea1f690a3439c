//! Perceptual quality metrics for the quality search.
//!
//! Every metric compares the luma plane of the original against the luma
//! plane of a decoded candidate and returns a single score. Scores are
//! interpreted through the metric's [`Polarity`]:
//!
//! | Metric | Polarity | Typical target |
//! |--------|----------|----------------|
//! | SSIM | higher is better | 0.9999 |
//! | MS-SSIM | higher is better | 0.94 |
//! | Smallfry | higher is better | 102.25 |
//! | MPE | lower is better | 1.0 |
//!
//! Adding a metric means adding a [`MetricEvaluator`] implementation and a
//! [`Metric`] variant; the search loop only ever sees the trait.

pub mod mpe;
pub mod ms_ssim;
pub mod smallfry;
pub mod ssim;

use std::fmt;
use std::str::FromStr;

use crate::error::{RecompressError, Result};
use crate::plane::LumaPlane;

/// Which direction of a score means "better looking".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Polarity {
    /// True when `score` does not yet meet `target`, i.e. the candidate is too
    /// distorted and the quality has to go up.
    pub fn is_distorted(self, score: f64, target: f64) -> bool {
        match self {
            // score < target means not similar enough
            Polarity::HigherIsBetter => score < target,
            // score >= target means too much error
            Polarity::LowerIsBetter => score >= target,
        }
    }
}

/// A scoring strategy over two equally sized luma planes.
///
/// Implementations must be pure and deterministic.
pub trait MetricEvaluator: Send + Sync {
    fn name(&self) -> &'static str;

    fn polarity(&self) -> Polarity;

    fn score(&self, original: &LumaPlane, candidate: &LumaPlane) -> Result<f64>;
}

/// The built-in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Ssim,
    MsSsim,
    Smallfry,
    Mpe,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Ssim, Metric::MsSsim, Metric::Smallfry, Metric::Mpe];

    /// Registry lookup.
    pub fn evaluator(self) -> &'static dyn MetricEvaluator {
        match self {
            Metric::Ssim => &ssim::Ssim,
            Metric::MsSsim => &ms_ssim::MsSsim,
            Metric::Smallfry => &smallfry::Smallfry,
            Metric::Mpe => &mpe::MeanPixelError,
        }
    }

    pub fn name(self) -> &'static str {
        self.evaluator().name()
    }

    pub fn polarity(self) -> Polarity {
        self.evaluator().polarity()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = RecompressError;

    fn from_str(s: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                RecompressError::invalid_argument(
                    "method",
                    s.to_string(),
                    "expected one of mpe, ssim, ms-ssim, smallfry",
                )
            })
    }
}

/// Both planes must have the same size; the candidate is decoded at the
/// original resolution, so a mismatch means the codec misbehaved.
pub(crate) fn ensure_same_dimensions(original: &LumaPlane, candidate: &LumaPlane) -> Result<()> {
    if original.dimensions() != candidate.dimensions() {
        return Err(RecompressError::dimension_mismatch(
            original.dimensions(),
            candidate.dimensions(),
        ));
    }
    Ok(())
}

/// Plane as f64 samples, optionally box-downsampled by an integer factor.
pub(crate) fn to_f64_downsampled(plane: &LumaPlane, factor: usize) -> (Vec<f64>, usize, usize) {
    let w = plane.width() as usize;
    let h = plane.height() as usize;
    let src = plane.as_slice();
    if factor <= 1 {
        return (src.iter().map(|&v| v as f64).collect(), w, h);
    }

    let ow = (w / factor).max(1);
    let oh = (h / factor).max(1);
    let fw = factor.min(w);
    let fh = factor.min(h);
    let norm = (fw * fh) as f64;
    let mut out = Vec::with_capacity(ow * oh);
    for oy in 0..oh {
        for ox in 0..ow {
            let mut sum = 0u32;
            for y in oy * fh..oy * fh + fh {
                let row = &src[y * w..(y + 1) * w];
                for &v in &row[ox * fw..ox * fw + fw] {
                    sum += v as u32;
                }
            }
            out.push(sum as f64 / norm);
        }
    }
    (out, ow, oh)
}
