// src/engine/encoder.rs
//
// Encoder operations: JPEG (mozjpeg) and WebP (libwebp).

use crate::config::Subsampling;
use crate::engine::common::{run_with_panic_as, EngineResult};
use crate::error::RecompressError;
use crate::plane::OriginalImage;
use mozjpeg::{ColorSpace, Compress, ScanMode};

use crate::engine::MAX_DIMENSION;

/// Libwebp "photo" preset values.
const WEBP_PHOTO_SNS_STRENGTH: i32 = 80;
const WEBP_PHOTO_FILTER_STRENGTH: i32 = 30;
const WEBP_PHOTO_FILTER_SHARPNESS: i32 = 3;
const WEBP_PHOTO_PREPROCESSING: i32 = 2;

/// Knobs for a single mozjpeg run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegEncodeSettings {
    pub quality: u8,
    pub subsampling: Subsampling,
    pub progressive: bool,
    pub optimize_coding: bool,
    /// Use mozjpeg's full profile (trellis quantisation). Changes the decoded
    /// pixels, unlike the other knobs.
    pub trellis: bool,
}

/// A panic inside a codec is an encode failure of that format.
fn encode_panic(format: &'static str) -> impl FnOnce(String) -> RecompressError {
    move |message| RecompressError::encode_failed(format, message)
}

/// Encode packed RGB to JPEG with mozjpeg.
pub fn encode_jpeg_with_settings(
    img: &OriginalImage,
    settings: &JpegEncodeSettings,
) -> EngineResult<Vec<u8>> {
    run_with_panic_as("encode:jpeg", encode_panic("jpeg"), || {
        let (w, h) = (img.width(), img.height());
        let pixels = img.rgb();

        if w == 0 || h == 0 {
            return Err(RecompressError::encode_failed(
                "jpeg",
                "Invalid image dimensions: width or height is zero",
            ));
        }
        if w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(RecompressError::dimension_exceeds_limit(
                w.max(h),
                MAX_DIMENSION,
            ));
        }

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        // Both calls reset every parameter, so they precede the other setters
        if !settings.trellis {
            comp.set_fastest_defaults();
        } else if settings.progressive && settings.optimize_coding {
            comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);
        }
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_quality(settings.quality.clamp(1, 100) as f32);

        match settings.subsampling {
            Subsampling::Default => comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2)),
            Subsampling::Disabled => comp.set_chroma_sampling_pixel_sizes((1, 1), (1, 1)),
        }

        if settings.progressive {
            if settings.optimize_coding {
                comp.set_optimize_scans(true);
            }
            comp.set_progressive_mode();
        } else {
            // The trellis profile starts out progressive; no scan script means one baseline scan
            comp.set_optimize_scans(false);
        }
        comp.set_optimize_coding(settings.optimize_coding);

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);

        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                RecompressError::encode_failed(
                    "jpeg",
                    format!("mozjpeg: failed to start compress: {e:?}"),
                )
            })?;

            let stride = w as usize * 3;
            for row in pixels.chunks(stride) {
                writer.write_scanlines(row).map_err(|e| {
                    RecompressError::encode_failed(
                        "jpeg",
                        format!("mozjpeg: failed to write scanlines: {e:?}"),
                    )
                })?;
            }

            writer.finish().map_err(|e| {
                RecompressError::encode_failed("jpeg", format!("mozjpeg: failed to finish: {e:?}"))
            })?;
        }

        Ok(output)
    })
}

/// Encode packed RGB to lossy WebP using the photo preset.
pub fn encode_webp(img: &OriginalImage, quality: u8) -> EngineResult<Vec<u8>> {
    run_with_panic_as("encode:webp", encode_panic("webp"), || {
        let encoder = webp::Encoder::from_rgb(img.rgb(), img.width(), img.height());

        let config = photo_config(quality)?;

        let mem = encoder.encode_advanced(&config).map_err(|e| {
            RecompressError::encode_failed("webp", format!("WebP encode failed: {e:?}"))
        })?;

        Ok(mem.to_vec())
    })
}

fn photo_config(quality: u8) -> EngineResult<webp::WebPConfig> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| RecompressError::encode_failed("webp", "failed to create WebPConfig"))?;
    config.lossless = 0;
    config.quality = quality.min(100) as f32;
    config.sns_strength = WEBP_PHOTO_SNS_STRENGTH;
    config.filter_strength = WEBP_PHOTO_FILTER_STRENGTH;
    config.filter_sharpness = WEBP_PHOTO_FILTER_SHARPNESS;
    config.preprocessing = WEBP_PHOTO_PREPROCESSING;
    Ok(config)
}
