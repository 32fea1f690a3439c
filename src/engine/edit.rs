// src/engine/edit.rs
//
// Lens correction applied to the decoded source before the search.

use crate::config::LensCorrection;

/// Undo barrel (fisheye) distortion on packed RGB.
///
/// Each output pixel looks up its source at `atan(r) / r` times its distance
/// from the centre, where `r` is that distance over
/// `sqrt(w² + h²) / strength`. Lookups are bilinear; anything that falls
/// outside the source comes out black.
pub fn defish(rgb: &[u8], width: u32, height: u32, lens: &LensCorrection) -> Vec<u8> {
    if !lens.is_enabled() {
        return rgb.to_vec();
    }

    let w = width as usize;
    let h = height as usize;
    let mid_x = (w / 2) as f32;
    let mid_y = (h / 2) as f32;
    let theta = ((w * w + h * h) as f32).sqrt() / lens.strength;

    let mut out = vec![0u8; w * h * 3];
    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - mid_x;
            let dy = y as f32 - mid_y;
            let r = (dx * dx + dy * dy).sqrt() / theta;
            let scale = if r == 0.0 { 1.0 } else { r.atan() / r };

            let sx = mid_x + scale * dx * lens.zoom;
            let sy = mid_y + scale * dy * lens.zoom;
            if let Some(px) = sample_bilinear(rgb, w, h, sx, sy) {
                let i = (y * w + x) * 3;
                out[i..i + 3].copy_from_slice(&px);
            }
        }
    }
    out
}

fn sample_bilinear(rgb: &[u8], w: usize, h: usize, sx: f32, sy: f32) -> Option<[u8; 3]> {
    if !(sx >= 0.0 && sy >= 0.0 && sx <= (w - 1) as f32 && sy <= (h - 1) as f32) {
        return None;
    }
    let x0 = sx.floor() as usize;
    let y0 = sy.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = sx - x0 as f32;
    let fy = sy - y0 as f32;

    let at = |x: usize, y: usize, c: usize| rgb[(y * w + x) * 3 + c] as f32;
    let mut px = [0u8; 3];
    for (c, slot) in px.iter_mut().enumerate() {
        let top = at(x0, y0, c) * (1.0 - fx) + at(x1, y0, c) * fx;
        let bottom = at(x0, y1, c) * (1.0 - fx) + at(x1, y1, c) * fx;
        *slot = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(px)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> Vec<u8> {
        (0..h)
            .flat_map(|y| (0..w).flat_map(move |x| [(x * 8) as u8, (y * 8) as u8, 77]))
            .collect()
    }

    #[test]
    fn test_disabled_is_identity() {
        let rgb = gradient(16, 12);
        assert_eq!(defish(&rgb, 16, 12, &LensCorrection::default()), rgb);
    }

    #[test]
    fn test_centre_pixel_is_fixed() {
        let rgb = gradient(17, 17);
        let lens = LensCorrection {
            strength: 2.5,
            zoom: 1.0,
        };
        let out = defish(&rgb, 17, 17, &lens);
        assert_eq!(out.len(), rgb.len());
        let centre = (8 * 17 + 8) * 3;
        assert_eq!(&out[centre..centre + 3], &rgb[centre..centre + 3]);
    }

    #[test]
    fn test_correction_pulls_samples_inward() {
        let rgb = gradient(32, 32);
        let lens = LensCorrection {
            strength: 3.0,
            zoom: 1.0,
        };
        let out = defish(&rgb, 32, 32, &lens);
        // Right edge now samples from left of x=31, so its red is smaller
        let i = (16 * 32 + 31) * 3;
        assert!(out[i] < rgb[i]);
    }

    #[test]
    fn test_zoom_out_leaves_black_border() {
        let rgb = vec![200u8; 20 * 20 * 3];
        let lens = LensCorrection {
            strength: 0.5,
            zoom: 2.0,
        };
        let out = defish(&rgb, 20, 20, &lens);
        assert_eq!(&out[..3], &[0, 0, 0]);
    }
}
