//! Smallfry: a blend of a PSNR term and a JPEG block-edge artifact term.
//!
//! The block term compares the step across every 8×8 block boundary in the
//! candidate with the same step in the original; only steps the encoder
//! added count against the candidate.

use super::{ensure_same_dimensions, MetricEvaluator, Polarity};
use crate::error::Result;
use crate::plane::LumaPlane;

const PSNR_WEIGHT: f64 = 37.1891885161239;
const AAE_WEIGHT: f64 = 78.5328607296973;
const PSNR_CAP_DB: f64 = 100.0;
const PSNR_SCALE_DB: f64 = 40.0;
const AAE_CAP: f64 = 15.0;
const BLOCK: usize = 8;

pub struct Smallfry;

impl MetricEvaluator for Smallfry {
    fn name(&self) -> &'static str {
        "smallfry"
    }

    fn polarity(&self) -> Polarity {
        Polarity::HigherIsBetter
    }

    fn score(&self, original: &LumaPlane, candidate: &LumaPlane) -> Result<f64> {
        ensure_same_dimensions(original, candidate)?;
        let p = psnr_factor(original, candidate);
        let a = aae_factor(original, candidate);
        Ok(p * PSNR_WEIGHT + a * AAE_WEIGHT)
    }
}

fn psnr_factor(original: &LumaPlane, candidate: &LumaPlane) -> f64 {
    let a = original.as_slice();
    let b = candidate.as_slice();
    let peak = a.iter().copied().max().unwrap_or(0).max(1) as f64;

    let sse: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as i64 - y as i64;
            (d * d) as u64
        })
        .sum();
    let psnr = if sse == 0 {
        PSNR_CAP_DB
    } else {
        let mse = sse as f64 / a.len() as f64;
        (10.0 * (peak * peak / mse).log10()).min(PSNR_CAP_DB)
    };
    psnr / PSNR_SCALE_DB
}

fn aae_factor(original: &LumaPlane, candidate: &LumaPlane) -> f64 {
    let w = original.width() as usize;
    let h = original.height() as usize;
    let a = original.as_slice();
    let b = candidate.as_slice();

    let step = |p: &[u8], i: usize, j: usize| (p[i] as i32 - p[j] as i32).abs();

    let mut excess = 0u64;
    let mut edges = 0u64;

    // Vertical block boundaries
    for row in 0..h {
        let base = row * w;
        let mut col = BLOCK - 1;
        while col + 1 < w {
            let added = step(b, base + col, base + col + 1) - step(a, base + col, base + col + 1);
            excess += added.max(0) as u64;
            edges += 1;
            col += BLOCK;
        }
    }

    // Horizontal block boundaries
    let mut row = BLOCK - 1;
    while row + 1 < h {
        for col in 0..w {
            let i = row * w + col;
            let added = step(b, i, i + w) - step(a, i, i + w);
            excess += added.max(0) as u64;
            edges += 1;
        }
        row += BLOCK;
    }

    if edges == 0 {
        return 1.0;
    }
    let aae = excess as f64 / edges as f64;
    1.0 - aae.min(AAE_CAP) / AAE_CAP
}
