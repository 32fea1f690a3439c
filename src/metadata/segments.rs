// src/metadata/segments.rs
//
// Bounds-checked walk over the marker segments of a JPEG header.

use crate::error::{RecompressError, Result};

pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const APP0: u8 = 0xE0;
pub const APP1: u8 = 0xE1;
pub const APP15: u8 = 0xEF;
pub const COM: u8 = 0xFE;
const TEM: u8 = 0x01;
const RST0: u8 = 0xD0;
const RST7: u8 = 0xD7;

/// One marker segment, located by byte range in the buffer it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub marker: u8,
    /// Offset of the 0xFF that introduces the marker.
    pub offset: usize,
    /// Total length: marker, length field and payload.
    pub len: usize,
}

impl Segment {
    /// Standalone markers carry no length field.
    pub fn is_standalone(marker: u8) -> bool {
        matches!(marker, TEM | SOI | EOI | RST0..=RST7)
    }

    pub fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.offset..self.offset + self.len]
    }

    /// Bytes after the length field; empty for standalone markers.
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        if Self::is_standalone(self.marker) {
            &[]
        } else {
            &data[self.offset + 4..self.offset + self.len]
        }
    }
}

/// Yields segments from SOI up to and including the first SOS or EOI.
///
/// Entropy-coded data is never entered. Padding 0xFF bytes before a marker
/// are skipped, as are stray bytes and `FF 00` pairs between segments
/// (libjpeg tolerates them too). Any length that runs past the end of the
/// buffer is an error.
pub struct SegmentCursor<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> SegmentCursor<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < 2 || data[0] != 0xFF || data[1] != SOI {
            return Err(RecompressError::malformed_jpeg(0, "missing SOI marker"));
        }
        Ok(Self {
            data,
            pos: 0,
            done: false,
        })
    }

    /// Find the next real marker, skipping stray bytes, fill bytes and
    /// `FF 00` pairs the way libjpeg does.
    fn next_marker(&mut self) -> Result<(usize, u8)> {
        let data = self.data;
        loop {
            let skipped_from = self.pos;
            while self.pos < data.len() && data[self.pos] != 0xFF {
                self.pos += 1;
            }
            if self.pos > skipped_from {
                tracing::warn!(
                    offset = skipped_from,
                    count = self.pos - skipped_from,
                    "skipping extraneous bytes between JPEG segments"
                );
            }

            // Fill bytes: any run of 0xFF, the last one starts the marker
            while self.pos + 1 < data.len() && data[self.pos + 1] == 0xFF {
                self.pos += 1;
            }
            if self.pos + 1 >= data.len() {
                return Err(RecompressError::malformed_jpeg(
                    self.pos,
                    "unexpected end of data before SOS",
                ));
            }

            let offset = self.pos;
            let marker = data[offset + 1];
            if marker != 0x00 {
                return Ok((offset, marker));
            }
            tracing::warn!(offset, "skipping stuffed zero byte outside entropy-coded data");
            self.pos = offset + 2;
        }
    }

    fn next_segment(&mut self) -> Result<Segment> {
        let data = self.data;
        let (offset, marker) = self.next_marker()?;

        let len = if Segment::is_standalone(marker) {
            2
        } else {
            if offset + 4 > data.len() {
                return Err(RecompressError::malformed_jpeg(
                    offset,
                    format!("truncated length field for marker 0x{marker:02X}"),
                ));
            }
            let declared = u16::from_be_bytes([data[offset + 2], data[offset + 3]]) as usize;
            if declared < 2 {
                return Err(RecompressError::malformed_jpeg(
                    offset,
                    format!("invalid segment length {declared} for marker 0x{marker:02X}"),
                ));
            }
            if offset + 2 + declared > data.len() {
                return Err(RecompressError::malformed_jpeg(
                    offset,
                    format!(
                        "segment 0x{marker:02X} declares {declared} bytes, only {} remain",
                        data.len() - offset - 2
                    ),
                ));
            }
            2 + declared
        };

        self.pos = offset + len;
        Ok(Segment {
            marker,
            offset,
            len,
        })
    }
}

impl Iterator for SegmentCursor<'_> {
    type Item = Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_segment() {
            Ok(segment) => {
                if segment.marker == SOS || segment.marker == EOI {
                    self.done = true;
                }
                Some(Ok(segment))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
