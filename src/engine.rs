// src/engine.rs
//
// The core of recompress. A single-threaded run that:
// 1. Decodes the source once (RGB + luma)
// 2. Bisects the encoder quality against a perceptual metric
// 3. Applies the variant's size policy and assembles the output
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// The search keeps the source RGB, its luma and one candidate alive at once.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod common;
mod decoder;
mod edit;
mod encoder;
mod guard;
mod io;
mod pipeline;
mod search;

pub use common::{run_with_panic_as, run_with_panic_policy, EngineResult};
pub use decoder::{
    check_dimensions, decode_input, decode_jpeg_luma, decode_jpeg_mozjpeg, decode_webp_luma,
    decode_with_image_crate, detect_format, DecodedInput,
};
pub use edit::defish;
pub use encoder::{encode_jpeg_with_settings, encode_webp, JpegEncodeSettings};
pub use guard::{MinimumSavings, SizeGuard, SizeVerdict, Unconditional};
pub use io::{read_input, write_output, STDIO_PATH};
pub use pipeline::{convert_to_webp, load_source, recompress_jpeg, Disposition, RunOutput};
pub use search::{bisect, SearchOutcome, SearchState, Trial};
