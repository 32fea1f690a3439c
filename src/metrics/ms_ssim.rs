//! Multi-scale SSIM with an 11×11 Gaussian window.

use super::ssim::{C1, C2};
use super::{ensure_same_dimensions, to_f64_downsampled, MetricEvaluator, Polarity};
use crate::error::Result;
use crate::plane::LumaPlane;

const WINDOW: usize = 11;
const SIGMA: f64 = 1.5;
const SCALE_WEIGHTS: [f64; 5] = [0.0448, 0.2856, 0.3001, 0.2363, 0.1333];

pub struct MsSsim;

impl MetricEvaluator for MsSsim {
    fn name(&self) -> &'static str {
        "ms-ssim"
    }

    fn polarity(&self) -> Polarity {
        Polarity::HigherIsBetter
    }

    fn score(&self, original: &LumaPlane, candidate: &LumaPlane) -> Result<f64> {
        ensure_same_dimensions(original, candidate)?;
        Ok(ms_ssim(original, candidate))
    }
}

/// How many dyadic scales fit an 11-pixel window. Always at least one.
fn scale_count(width: usize, height: usize) -> usize {
    let mut short = width.min(height);
    let mut scales = 1;
    while scales < SCALE_WEIGHTS.len() && short / 2 >= WINDOW {
        short /= 2;
        scales += 1;
    }
    scales
}

fn ms_ssim(original: &LumaPlane, candidate: &LumaPlane) -> f64 {
    let (mut x, mut w, mut h) = to_f64_downsampled(original, 1);
    let (mut y, _, _) = to_f64_downsampled(candidate, 1);

    let scales = scale_count(w, h);
    let weight_sum: f64 = SCALE_WEIGHTS[..scales].iter().sum();

    let mut result = 1.0;
    for (scale, weight) in SCALE_WEIGHTS[..scales].iter().enumerate() {
        let kernel = gaussian_kernel(WINDOW.min(w).min(h));
        let (luminance, contrast_structure) = components(&x, &y, w, h, &kernel);
        let exponent = weight / weight_sum;

        result *= contrast_structure.max(0.0).powf(exponent);
        if scale + 1 == scales {
            result *= luminance.max(0.0).powf(exponent);
        } else {
            (x, _, _) = halve(&x, w, h);
            (y, w, h) = halve(&y, w, h);
        }
    }
    result
}

/// Mean luminance term and mean contrast-structure term at one scale.
fn components(x: &[f64], y: &[f64], w: usize, h: usize, kernel: &[f64]) -> (f64, f64) {
    let products = |f: fn(f64, f64) -> f64| -> Vec<f64> {
        x.iter().zip(y).map(|(&a, &b)| f(a, b)).collect()
    };
    let (mu_x, ow, oh) = filter_valid(x, w, h, kernel);
    let (mu_y, _, _) = filter_valid(y, w, h, kernel);
    let (xx, _, _) = filter_valid(&products(|a, _| a * a), w, h, kernel);
    let (yy, _, _) = filter_valid(&products(|_, b| b * b), w, h, kernel);
    let (xy, _, _) = filter_valid(&products(|a, b| a * b), w, h, kernel);

    let count = (ow * oh) as f64;
    let mut l_sum = 0.0;
    let mut cs_sum = 0.0;
    for i in 0..ow * oh {
        let mx = mu_x[i];
        let my = mu_y[i];
        let var_x = xx[i] - mx * mx;
        let var_y = yy[i] - my * my;
        let cov = xy[i] - mx * my;
        l_sum += (2.0 * mx * my + C1) / (mx * mx + my * my + C1);
        cs_sum += (2.0 * cov + C2) / (var_x + var_y + C2);
    }
    (l_sum / count, cs_sum / count)
}

/// Normalised 1-D Gaussian taps.
fn gaussian_kernel(size: usize) -> Vec<f64> {
    let center = (size as f64 - 1.0) / 2.0;
    let taps: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * SIGMA * SIGMA)).exp()
        })
        .collect();
    let sum: f64 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

/// Separable convolution keeping only fully covered positions.
fn filter_valid(src: &[f64], w: usize, h: usize, kernel: &[f64]) -> (Vec<f64>, usize, usize) {
    let k = kernel.len();
    let ow = w - k + 1;
    let oh = h - k + 1;

    let mut horizontal = Vec::with_capacity(ow * h);
    for row in src.chunks_exact(w) {
        for col in 0..ow {
            let acc: f64 = row[col..col + k]
                .iter()
                .zip(kernel)
                .map(|(v, t)| v * t)
                .sum();
            horizontal.push(acc);
        }
    }

    let mut out = Vec::with_capacity(ow * oh);
    for row in 0..oh {
        for col in 0..ow {
            let acc: f64 = kernel
                .iter()
                .enumerate()
                .map(|(i, t)| horizontal[(row + i) * ow + col] * t)
                .sum();
            out.push(acc);
        }
    }
    (out, ow, oh)
}

/// 2×2 box average, dropping an odd trailing row/column.
fn halve(src: &[f64], w: usize, h: usize) -> (Vec<f64>, usize, usize) {
    let ow = (w / 2).max(1);
    let oh = (h / 2).max(1);
    let mut out = Vec::with_capacity(ow * oh);
    for row in 0..oh {
        for col in 0..ow {
            let r0 = (row * 2).min(h - 1);
            let r1 = (row * 2 + 1).min(h - 1);
            let c0 = (col * 2).min(w - 1);
            let c1 = (col * 2 + 1).min(w - 1);
            out.push(
                (src[r0 * w + c0] + src[r0 * w + c1] + src[r1 * w + c0] + src[r1 * w + c1]) / 4.0,
            );
        }
    }
    (out, ow, oh)
}
