// src/codecs/mod.rs
//
// Codec adapters driven by the quality search.
//
// The search only needs three things from a codec: encode at a quality,
// decode a candidate back to luma, and a name for logs. Everything format
// specific (progressive scans, subsampling, presets) stays behind this seam.

pub mod jpeg;
pub mod webp;

use crate::error::Result;
use crate::plane::{LumaPlane, OriginalImage};

pub use self::jpeg::JpegCodec;
pub use self::webp::WebpCodec;

/// Whether an encode is a throwaway trial or may end up as the output.
///
/// Codecs may spend more effort on `Final` encodes, but only in ways that
/// keep the quality/score relationship intact for the bytes that are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStage {
    Exploratory,
    Final,
}

pub trait CodecAdapter {
    /// Short format name, e.g. "jpeg".
    fn format(&self) -> &'static str;

    fn encode(&self, image: &OriginalImage, quality: u8, stage: EncodeStage) -> Result<Vec<u8>>;

    /// Decode a candidate produced by [`CodecAdapter::encode`] to its luma.
    fn decode_luma(&self, bytes: &[u8]) -> Result<LumaPlane>;
}
