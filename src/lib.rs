// lib.rs
//
// recompress: shrink images to the smallest size that still meets a
// perceptual quality target.
//
// Two front ends share one core:
// - jpeg-recompress: JPEG in, JPEG out, metadata preserved
// - archive2webp: JPEG/PPM in, lossy WebP out
//
// The core bisects the encoder quality, scoring every candidate against the
// original with SSIM, MS-SSIM, Smallfry or mean pixel error.

// Memory allocator optimization - jemalloc
// Note: jemalloc is not supported on Windows/MSVC, so we exclude it on that platform
#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub mod cli;
pub mod codecs;
pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod plane;

/// Name reported when a JPEG has already been through the re-encoder.
pub const JPEG_TOOL_NAME: &str = "jpeg-recompress";

/// Written into a COM segment of every re-encoded JPEG.
pub const JPEG_SIGNATURE: &str = "Compressed by jpeg-recompress";

pub use config::{ConvertConfig, RecompressConfig};
pub use engine::{convert_to_webp, recompress_jpeg, Disposition, RunOutput};
pub use error::{RecompressError, Result};
pub use metrics::Metric;
