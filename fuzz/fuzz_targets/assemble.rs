#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use recompress::metadata::{assemble, scan_metadata, signature_segment};
use recompress::JPEG_SIGNATURE;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    candidate: &'a [u8],
    metadata: &'a [u8],
}

// Whatever goes in, assemble either refuses or hands back a file whose
// header scans and carries the signature.
fuzz_target!(|input: Input| {
    let Ok(signature) = signature_segment(JPEG_SIGNATURE) else {
        return;
    };
    if let Ok(out) = assemble(input.candidate, &signature, input.metadata) {
        let block = scan_metadata(&out, JPEG_SIGNATURE.as_bytes());
        assert!(block.map(|b| b.already_processed()).unwrap_or(true));
    }
});
