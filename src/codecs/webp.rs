// src/codecs/webp.rs
//
// libwebp-backed adapter for the conversion variant.

use super::{CodecAdapter, EncodeStage};
use crate::engine::{decode_webp_luma, encode_webp};
use crate::error::Result;
use crate::plane::{LumaPlane, OriginalImage};

/// Lossy WebP with the photo preset. Every stage encodes identically.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpCodec;

impl CodecAdapter for WebpCodec {
    fn format(&self) -> &'static str {
        "webp"
    }

    fn encode(&self, image: &OriginalImage, quality: u8, _stage: EncodeStage) -> Result<Vec<u8>> {
        encode_webp(image, quality)
    }

    fn decode_luma(&self, bytes: &[u8]) -> Result<LumaPlane> {
        decode_webp_luma(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_encode_identically() {
        let rgb: Vec<u8> = (0..40 * 40 * 3).map(|i| (i % 251) as u8).collect();
        let img = OriginalImage::from_rgb(rgb, 40, 40).unwrap();
        let a = WebpCodec.encode(&img, 60, EncodeStage::Exploratory).unwrap();
        let b = WebpCodec.encode(&img, 60, EncodeStage::Final).unwrap();
        assert_eq!(a, b);
        assert_eq!(WebpCodec.decode_luma(&a).unwrap().dimensions(), (40, 40));
    }
}
