// src/engine/decoder.rs
//
// Decoder operations: source images (JPEG via mozjpeg, PPM and friends via
// the image crate) and the luma-only decodes used to score candidates.

use crate::config::InputFormat;
use crate::engine::common::{run_with_panic_as, EngineResult};
use crate::error::RecompressError;
use crate::plane::{rgb_to_luma, LumaPlane, OriginalImage};
use image::ImageFormat;
use mozjpeg::Decompress;
use webp::{BitstreamFeatures, Decoder as WebPDecoder};

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};

/// Decoded source plus what it was decoded from.
#[derive(Debug)]
pub struct DecodedInput {
    pub image: OriginalImage,
    pub format: ImageFormat,
}

/// Decode JPEG to packed RGB using mozjpeg (backed by libjpeg-turbo).
pub fn decode_jpeg_mozjpeg(data: &[u8]) -> EngineResult<OriginalImage> {
    run_with_panic_as("decode:mozjpeg", RecompressError::decode_failed, || {
        let decompress = Decompress::new_mem(data).map_err(|e| {
            RecompressError::decode_failed(format!("mozjpeg decompress init failed: {e:?}"))
        })?;

        let mut decompress = decompress.rgb().map_err(|e| {
            RecompressError::decode_failed(format!("mozjpeg rgb conversion failed: {e:?}"))
        })?;

        let width = decompress.width() as u32;
        let height = decompress.height() as u32;
        check_dimensions(width, height)?;

        let pixels: Vec<[u8; 3]> = decompress.read_scanlines().map_err(|e| {
            RecompressError::decode_failed(format!("mozjpeg: failed to read scanlines: {e:?}"))
        })?;
        let flat_pixels: Vec<u8> = pixels.into_iter().flatten().collect();

        OriginalImage::from_rgb(flat_pixels, width, height)
    })
}

/// Decode a JPEG straight to its Y channel. Used on every search trial, so
/// the chroma planes are never converted.
pub fn decode_jpeg_luma(data: &[u8]) -> EngineResult<LumaPlane> {
    let candidate_failed = |message: String| RecompressError::candidate_decode_failed("jpeg", message);
    run_with_panic_as("decode:jpeg:luma", candidate_failed, || {
        let decompress = Decompress::new_mem(data).map_err(|e| {
            candidate_failed(format!("mozjpeg decompress init failed: {e:?}"))
        })?;
        let mut decompress = decompress.grayscale().map_err(|e| {
            candidate_failed(format!("mozjpeg grayscale conversion failed: {e:?}"))
        })?;

        let width = decompress.width() as u32;
        let height = decompress.height() as u32;
        let luma: Vec<u8> = decompress
            .read_scanlines()
            .map_err(|e| candidate_failed(format!("mozjpeg: failed to read scanlines: {e:?}")))?;

        LumaPlane::new(width, height, luma).map_err(|e| candidate_failed(e.to_string()))
    })
}

/// Decode a WebP candidate with libwebp and derive its luma.
pub fn decode_webp_luma(data: &[u8]) -> EngineResult<LumaPlane> {
    let candidate_failed = |message: String| RecompressError::candidate_decode_failed("webp", message);
    run_with_panic_as("decode:webp:luma", candidate_failed, || {
        let features = BitstreamFeatures::new(data)
            .ok_or_else(|| candidate_failed("failed to read bitstream features".to_string()))?;
        let (width, height) = (features.width(), features.height());

        let decoded = WebPDecoder::new(data)
            .decode()
            .ok_or_else(|| candidate_failed("libwebp decode failed".to_string()))?;
        let pixels: &[u8] = &decoded;

        let count = width as usize * height as usize;
        if count == 0 || pixels.len() % count != 0 {
            return Err(candidate_failed(format!(
                "unexpected buffer of {} bytes for {}x{}",
                pixels.len(),
                width,
                height
            )));
        }
        let channels = pixels.len() / count;
        if channels != 3 && channels != 4 {
            return Err(candidate_failed(format!("unexpected {channels} channels")));
        }

        let luma = pixels
            .chunks_exact(channels)
            .map(|px| rgb_to_luma(px[0], px[1], px[2]))
            .collect();
        LumaPlane::new(width, height, luma).map_err(|e| candidate_failed(e.to_string()))
    })
}

/// Decode anything else the image crate understands (PPM, PNG, WebP input).
pub fn decode_with_image_crate(
    data: &[u8],
    format: Option<ImageFormat>,
) -> EngineResult<OriginalImage> {
    run_with_panic_as("decode:image", RecompressError::decode_failed, || {
        let img = match format {
            Some(format) => image::load_from_memory_with_format(data, format),
            None => image::load_from_memory(data),
        }
        .map_err(|e| RecompressError::decode_failed(format!("decode failed: {e}")))?;

        check_dimensions(img.width(), img.height())?;
        // Alpha is dropped; the metrics and both output codecs are RGB only
        let rgb = img.into_rgb8();
        let (width, height) = rgb.dimensions();
        OriginalImage::from_rgb(rgb.into_raw(), width, height)
    })
}

/// Detect input format using magic bytes. Returns None if unknown.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Decode the source image.
///
/// `Auto` sniffs magic bytes; an explicit format skips sniffing and fails if
/// the bytes do not decode as that format.
pub fn decode_input(bytes: &[u8], requested: InputFormat) -> EngineResult<DecodedInput> {
    if bytes.is_empty() {
        return Err(RecompressError::decode_failed("input is empty"));
    }
    let format = match requested {
        InputFormat::Jpeg => ImageFormat::Jpeg,
        InputFormat::Ppm => ImageFormat::Pnm,
        InputFormat::Auto => detect_format(bytes)
            .ok_or_else(|| RecompressError::unsupported_format("unknown"))?,
    };

    let image = match format {
        ImageFormat::Jpeg => decode_jpeg_mozjpeg(bytes)?,
        ImageFormat::Pnm | ImageFormat::Png | ImageFormat::WebP => {
            decode_with_image_crate(bytes, Some(format))?
        }
        other => {
            return Err(RecompressError::unsupported_format(format!("{other:?}")));
        }
    };
    Ok(DecodedInput { image, format })
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> EngineResult<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RecompressError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(RecompressError::decode_failed(format!(
            "image has {pixels} pixels, limit is {MAX_PIXELS}"
        )));
    }
    Ok(())
}
