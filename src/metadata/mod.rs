// src/metadata/mod.rs
//
// JPEG metadata splicing: lift the auxiliary segments out of the original
// file, then rebuild the output around a freshly encoded candidate.
//
// Output layout:
//
//   SOI | APP0 (from candidate) | COM signature | original APPn/COM | rest of candidate

pub mod segments;

use crate::error::{RecompressError, Result};
use img_parts::jpeg::{markers, Jpeg};
use img_parts::Bytes;

pub use segments::{Segment, SegmentCursor};
use segments::{APP0, APP1, APP15, COM, SOI};

/// Auxiliary bytes lifted from the original file, in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataBlock {
    bytes: Vec<u8>,
    segments: usize,
    already_processed: bool,
}

impl MetadataBlock {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of segments kept.
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// True when a COM segment already carries our signature.
    pub fn already_processed(&self) -> bool {
        self.already_processed
    }

    /// Drop every kept segment. The processed flag survives.
    pub fn stripped(self) -> Self {
        Self {
            bytes: Vec::new(),
            segments: 0,
            already_processed: self.already_processed,
        }
    }
}

/// Collect APP1..APP15 and COM segments from the header of `jpeg`.
///
/// APP0 is left behind (the candidate brings its own) and so is any COM
/// whose payload contains `signature`; finding one marks the block as
/// already processed.
pub fn scan_metadata(jpeg: &[u8], signature: &[u8]) -> Result<MetadataBlock> {
    let mut block = MetadataBlock::default();
    for segment in SegmentCursor::new(jpeg)? {
        let segment = segment?;
        match segment.marker {
            COM if contains(segment.payload(jpeg), signature) => {
                block.already_processed = true;
            }
            COM | APP1..=APP15 => {
                block.bytes.extend_from_slice(segment.bytes(jpeg));
                block.segments += 1;
            }
            _ => {}
        }
    }
    tracing::debug!(
        segments = block.segments,
        bytes = block.bytes.len(),
        already_processed = block.already_processed,
        "scanned JPEG metadata"
    );
    Ok(block)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty()
        && haystack.len() >= needle.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Build the COM segment that marks output as processed.
pub fn signature_segment(signature: &str) -> Result<Vec<u8>> {
    let declared = signature.len() + 2;
    let declared = u16::try_from(declared).map_err(|_| {
        RecompressError::invalid_argument(
            "signature",
            signature.to_string(),
            "too long for a COM segment",
        )
    })?;
    let mut out = Vec::with_capacity(signature.len() + 4);
    out.extend_from_slice(&[0xFF, COM]);
    out.extend_from_slice(&declared.to_be_bytes());
    out.extend_from_slice(signature.as_bytes());
    Ok(out)
}

/// Splice `signature` and `metadata` into `candidate` right after its APP0.
///
/// The candidate must start with SOI followed by APP0; anything else is
/// refused rather than written out as a broken file.
pub fn assemble(candidate: &[u8], signature: &[u8], metadata: &[u8]) -> Result<Vec<u8>> {
    if candidate.len() < 2 || candidate[..2] != [0xFF, SOI] {
        return Err(RecompressError::corrupt_output("candidate is missing SOI"));
    }
    if candidate.len() < 6 || candidate[2..4] != [0xFF, APP0] {
        return Err(RecompressError::corrupt_output(
            "candidate has no APP0 segment after SOI",
        ));
    }
    let app0_len = u16::from_be_bytes([candidate[4], candidate[5]]) as usize;
    let head_end = 4 + app0_len;
    if app0_len < 2 || head_end > candidate.len() {
        return Err(RecompressError::corrupt_output(format!(
            "candidate APP0 length {app0_len} is out of bounds"
        )));
    }

    let mut out = Vec::with_capacity(candidate.len() + signature.len() + metadata.len());
    out.extend_from_slice(&candidate[..head_end]);
    out.extend_from_slice(signature);
    out.extend_from_slice(metadata);
    out.extend_from_slice(&candidate[head_end..]);

    verify_structure(&out)?;
    Ok(out)
}

/// Independent parse of the assembled file.
fn verify_structure(out: &[u8]) -> Result<()> {
    let jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(out)).map_err(|e| {
        RecompressError::corrupt_output(format!("assembled JPEG does not parse: {e}"))
    })?;
    let segments = jpeg.segments();
    match segments.first().map(|s| s.marker()) {
        Some(markers::APP0) => Ok(()),
        other => Err(RecompressError::corrupt_output(format!(
            "assembled JPEG starts with marker {other:02X?} instead of APP0"
        ))),
    }
}
