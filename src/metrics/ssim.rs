//! Structural similarity (SSIM) over 8×8 windows.
//!
//! Large planes are box-downsampled first so the window covers roughly the
//! same visual angle regardless of resolution.

use super::{ensure_same_dimensions, to_f64_downsampled, MetricEvaluator, Polarity};
use crate::error::Result;
use crate::plane::LumaPlane;

const WINDOW: usize = 8;
pub(crate) const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
pub(crate) const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

pub struct Ssim;

impl MetricEvaluator for Ssim {
    fn name(&self) -> &'static str {
        "ssim"
    }

    fn polarity(&self) -> Polarity {
        Polarity::HigherIsBetter
    }

    fn score(&self, original: &LumaPlane, candidate: &LumaPlane) -> Result<f64> {
        ensure_same_dimensions(original, candidate)?;
        Ok(ssim(original, candidate))
    }
}

/// Downsampling factor: one step per 256 pixels of the shorter side.
pub(crate) fn scale_factor(width: u32, height: u32) -> usize {
    let short = width.min(height) as f64;
    ((short / 256.0).round() as usize).max(1)
}

fn ssim(original: &LumaPlane, candidate: &LumaPlane) -> f64 {
    let factor = scale_factor(original.width(), original.height());
    let (x, w, h) = to_f64_downsampled(original, factor);
    let (y, _, _) = to_f64_downsampled(candidate, factor);

    let win = WINDOW.min(w).min(h);
    let sums = IntegralSums::new(&x, &y, w, h);
    let n = (win * win) as f64;

    let mut total = 0.0;
    let mut count = 0usize;
    for top in 0..=h - win {
        for left in 0..=w - win {
            let s = sums.window(left, top, win);
            let mu_x = s.x / n;
            let mu_y = s.y / n;
            let var_x = s.xx / n - mu_x * mu_x;
            let var_y = s.yy / n - mu_y * mu_y;
            let cov = s.xy / n - mu_x * mu_y;

            let num = (2.0 * mu_x * mu_y + C1) * (2.0 * cov + C2);
            let den = (mu_x * mu_x + mu_y * mu_y + C1) * (var_x + var_y + C2);
            total += num / den;
            count += 1;
        }
    }
    total / count as f64
}

#[derive(Default, Clone, Copy)]
struct Moments {
    x: f64,
    y: f64,
    xx: f64,
    yy: f64,
    xy: f64,
}

/// Summed-area tables for the five first/second order moments.
struct IntegralSums {
    stride: usize,
    table: Vec<Moments>,
}

impl IntegralSums {
    fn new(x: &[f64], y: &[f64], w: usize, h: usize) -> Self {
        let stride = w + 1;
        let mut table = vec![Moments::default(); stride * (h + 1)];
        for row in 0..h {
            let mut acc = Moments::default();
            for col in 0..w {
                let a = x[row * w + col];
                let b = y[row * w + col];
                acc.x += a;
                acc.y += b;
                acc.xx += a * a;
                acc.yy += b * b;
                acc.xy += a * b;

                let above = table[row * stride + col + 1];
                table[(row + 1) * stride + col + 1] = Moments {
                    x: above.x + acc.x,
                    y: above.y + acc.y,
                    xx: above.xx + acc.xx,
                    yy: above.yy + acc.yy,
                    xy: above.xy + acc.xy,
                };
            }
        }
        Self { stride, table }
    }

    fn window(&self, left: usize, top: usize, size: usize) -> Moments {
        let at = |col: usize, row: usize| self.table[row * self.stride + col];
        let br = at(left + size, top + size);
        let bl = at(left, top + size);
        let tr = at(left + size, top);
        let tl = at(left, top);
        Moments {
            x: br.x - bl.x - tr.x + tl.x,
            y: br.y - bl.y - tr.y + tl.y,
            xx: br.xx - bl.xx - tr.xx + tl.xx,
            yy: br.yy - bl.yy - tr.yy + tl.yy,
            xy: br.xy - bl.xy - tr.xy + tl.xy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> LumaPlane {
        let data = (0..h)
            .flat_map(|y| (0..w).map(move |x| ((x * 7 + y * 3) % 256) as u8))
            .collect();
        LumaPlane::new(w, h, data).unwrap()
    }

    fn add_noise(plane: &LumaPlane, amplitude: i32) -> LumaPlane {
        let data = plane
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let delta = if i % 2 == 0 { amplitude } else { -amplitude };
                (v as i32 + delta).clamp(0, 255) as u8
            })
            .collect();
        LumaPlane::new(plane.width(), plane.height(), data).unwrap()
    }

    #[test]
    fn test_identical_planes_score_one() {
        let plane = gradient(64, 48);
        let score = Ssim.score(&plane, &plane).unwrap();
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_more_noise_scores_lower() {
        let plane = gradient(64, 64);
        let light = Ssim.score(&plane, &add_noise(&plane, 2)).unwrap();
        let heavy = Ssim.score(&plane, &add_noise(&plane, 20)).unwrap();
        assert!(light < 1.0);
        assert!(heavy < light);
    }

    #[test]
    fn test_tiny_planes_use_smaller_window() {
        let plane = gradient(3, 5);
        let score = Ssim.score(&plane, &plane).unwrap();
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_factor() {
        assert_eq!(scale_factor(100, 100), 1);
        assert_eq!(scale_factor(640, 480), 2);
        assert_eq!(scale_factor(4000, 3000), 12);
    }
}
