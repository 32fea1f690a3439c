#![no_main]

use libfuzzer_sys::fuzz_target;
use recompress::metadata::{scan_metadata, SegmentCursor};
use recompress::JPEG_SIGNATURE;

fuzz_target!(|data: &[u8]| {
    if let Ok(cursor) = SegmentCursor::new(data) {
        for segment in cursor.flatten() {
            assert!(segment.offset + segment.len <= data.len());
        }
    }
    if let Ok(block) = scan_metadata(data, JPEG_SIGNATURE.as_bytes()) {
        assert!(block.len() <= data.len());
    }
});
