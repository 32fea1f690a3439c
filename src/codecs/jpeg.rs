// src/codecs/jpeg.rs
//
// mozjpeg-backed adapter for the re-encode variant.

use super::{CodecAdapter, EncodeStage};
use crate::config::JpegOptions;
use crate::engine::{decode_jpeg_luma, encode_jpeg_with_settings, JpegEncodeSettings};
use crate::error::Result;
use crate::plane::{LumaPlane, OriginalImage};

/// Exploratory encodes use mozjpeg's fastest profile. The final encode gets
/// trellis quantisation and optimised Huffman tables, plus progressive scans
/// unless they are turned off.
///
/// With `accurate` set every trial is encoded the way the final one will be,
/// so the score of the kept candidate is exactly the score the search saw.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec {
    options: JpegOptions,
}

impl JpegCodec {
    pub fn new(options: JpegOptions) -> Self {
        Self { options }
    }

    pub fn settings(&self, quality: u8, stage: EncodeStage) -> JpegEncodeSettings {
        let final_like = stage == EncodeStage::Final || self.options.accurate;
        JpegEncodeSettings {
            quality,
            subsampling: self.options.subsampling,
            progressive: self.options.progressive && final_like,
            optimize_coding: final_like,
            trellis: final_like,
        }
    }
}

impl CodecAdapter for JpegCodec {
    fn format(&self) -> &'static str {
        "jpeg"
    }

    fn encode(&self, image: &OriginalImage, quality: u8, stage: EncodeStage) -> Result<Vec<u8>> {
        encode_jpeg_with_settings(image, &self.settings(quality, stage))
    }

    fn decode_luma(&self, bytes: &[u8]) -> Result<LumaPlane> {
        decode_jpeg_luma(bytes)
    }
}
