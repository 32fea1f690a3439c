// src/plane.rs
//
// Pixel buffers shared by the codecs, the metrics and the search.

use crate::error::{RecompressError, Result};

/// Single-channel 8-bit plane, row-major, no padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LumaPlane {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl LumaPlane {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(RecompressError::decode_failed(format!(
                "luma plane of {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Derive luma from packed RGB.
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(RecompressError::decode_failed(format!(
                "RGB buffer of {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                rgb.len()
            )));
        }
        let data = rgb
            .chunks_exact(3)
            .map(|px| rgb_to_luma(px[0], px[1], px[2]))
            .collect();
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

/// BT.601 luma in 16-bit fixed point, the same Y a JPEG decoder hands back
/// for a grayscale read.
#[inline]
pub fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 19595 * r as u32 + 38470 * g as u32 + 7471 * b as u32 + 32768;
    (y >> 16) as u8
}

/// The decoded source image. Created once per run and only read afterwards.
#[derive(Clone, Debug)]
pub struct OriginalImage {
    rgb: Vec<u8>,
    luma: LumaPlane,
}

impl OriginalImage {
    pub fn from_rgb(rgb: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let luma = LumaPlane::from_rgb(&rgb, width, height)?;
        Ok(Self { rgb, luma })
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn luma(&self) -> &LumaPlane {
        &self.luma
    }

    pub fn width(&self) -> u32 {
        self.luma.width
    }

    pub fn height(&self) -> u32 {
        self.luma.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_extremes() {
        assert_eq!(rgb_to_luma(0, 0, 0), 0);
        assert_eq!(rgb_to_luma(255, 255, 255), 255);
        // Pure channels follow the BT.601 weights
        assert_eq!(rgb_to_luma(255, 0, 0), 76);
        assert_eq!(rgb_to_luma(0, 255, 0), 150);
        assert_eq!(rgb_to_luma(0, 0, 255), 29);
    }

    #[test]
    fn test_gray_input_is_preserved() {
        for v in [0u8, 1, 17, 128, 200, 254, 255] {
            assert_eq!(rgb_to_luma(v, v, v), v);
        }
    }

    #[test]
    fn test_plane_size_checked() {
        assert!(LumaPlane::new(4, 4, vec![0; 16]).is_ok());
        assert!(LumaPlane::new(4, 4, vec![0; 15]).is_err());
        assert!(LumaPlane::new(0, 4, vec![]).is_err());
        assert!(LumaPlane::from_rgb(&[0; 11], 2, 2).is_err());
    }

    #[test]
    fn test_original_image_derives_luma() {
        let rgb = vec![255, 255, 255, 0, 0, 0];
        let img = OriginalImage::from_rgb(rgb, 2, 1).unwrap();
        assert_eq!(img.luma().as_slice(), &[255, 0]);
        assert_eq!((img.width(), img.height()), (2, 1));
    }
}
