// src/engine/pipeline.rs
//
// Run orchestration for both variants:
//   decode -> (lens correction) -> bisect -> size guard -> assemble
//
// Nothing here touches the filesystem; callers hand in bytes and get bytes
// back together with what happened to them.

use crate::codecs::{CodecAdapter, JpegCodec, WebpCodec};
use crate::config::{
    ConvertConfig, InputFormat, LensCorrection, RecompressConfig, SearchConfig, Variant,
};
use crate::engine::common::EngineResult;
use crate::engine::decoder::{decode_input, DecodedInput};
use crate::engine::edit::defish;
use crate::engine::guard::{MinimumSavings, SizeGuard, SizeVerdict, Unconditional};
use crate::engine::search::{bisect, SearchOutcome};
use crate::error::RecompressError;
use crate::metadata::{assemble, scan_metadata, signature_segment, MetadataBlock};
use crate::plane::OriginalImage;
use crate::{JPEG_SIGNATURE, JPEG_TOOL_NAME};
use image::ImageFormat;
use tracing::{debug, info};

/// What a successful run did with its input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Disposition {
    Optimized { quality: u8, score: f64 },
    /// Input already carried the signature and was passed through.
    CopiedAlreadyProcessed,
    /// Re-encoding would not have saved enough; input passed through.
    CopiedNoSavings,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub bytes: Vec<u8>,
    pub disposition: Disposition,
}

impl RunOutput {
    fn copied(input: &[u8], disposition: Disposition) -> Self {
        Self {
            bytes: input.to_vec(),
            disposition,
        }
    }

    pub fn is_copy(&self) -> bool {
        !matches!(self.disposition, Disposition::Optimized { .. })
    }
}

/// Decode the source and apply lens correction if asked for.
pub fn load_source(
    input: &[u8],
    format: InputFormat,
    lens: &LensCorrection,
) -> EngineResult<DecodedInput> {
    let decoded = decode_input(input, format)?;
    if !lens.is_enabled() {
        return Ok(decoded);
    }
    let (w, h) = (decoded.image.width(), decoded.image.height());
    debug!(strength = lens.strength, zoom = lens.zoom, "applying lens correction");
    let corrected = defish(decoded.image.rgb(), w, h, lens);
    Ok(DecodedInput {
        image: OriginalImage::from_rgb(corrected, w, h)?,
        format: decoded.format,
    })
}

/// JPEG (or PPM) in, JPEG out, metadata carried over.
pub fn recompress_jpeg(input: &[u8], config: &RecompressConfig) -> EngineResult<RunOutput> {
    config.validate()?;
    let policy = &config.policy;
    let source = load_source(input, config.input_format, &config.lens)?;

    let metadata = if source.format == ImageFormat::Jpeg {
        scan_metadata(input, JPEG_SIGNATURE.as_bytes())?
    } else {
        MetadataBlock::default()
    };

    if metadata.already_processed() {
        if policy.copy_through {
            info!("File already processed by {}!", JPEG_TOOL_NAME);
            return Ok(RunOutput::copied(input, Disposition::CopiedAlreadyProcessed));
        }
        return Err(RecompressError::already_processed(JPEG_TOOL_NAME));
    }

    let metadata = if policy.strip_metadata {
        metadata.stripped()
    } else {
        info!("Metadata size is {}kb", metadata.len() / 1024);
        metadata
    };

    let outcome = search(
        &JpegCodec::new(config.jpeg),
        &source,
        &config.search,
        Variant::Reencode,
    )?;
    drop(source);

    let signature = signature_segment(JPEG_SIGNATURE)?;
    let guard = MinimumSavings {
        marker_overhead: signature.len() as u64,
        min_delta: policy.min_delta,
    };
    let verdict = guard.evaluate(
        outcome.candidate.len() as u64,
        metadata.len() as u64,
        input.len() as u64,
    );
    if let SizeVerdict::Reject { total } = verdict {
        if policy.copy_through {
            info!("Output file would be larger than input!");
            return Ok(RunOutput::copied(input, Disposition::CopiedNoSavings));
        }
        return Err(RecompressError::size_regression(total, input.len() as u64));
    }

    let bytes = assemble(&outcome.candidate, &signature, metadata.as_bytes())?;
    log_savings(bytes.len(), input.len());
    Ok(RunOutput {
        bytes,
        disposition: Disposition::Optimized {
            quality: outcome.quality,
            score: outcome.score,
        },
    })
}

/// Any supported raster in, lossy WebP out. Always emits the winner.
pub fn convert_to_webp(input: &[u8], config: &ConvertConfig) -> EngineResult<RunOutput> {
    config.validate()?;
    let source = load_source(input, config.input_format, &config.lens)?;

    let outcome = search(&WebpCodec, &source, &config.search, Variant::Convert)?;
    drop(source);

    let verdict = Unconditional.evaluate(outcome.candidate.len() as u64, 0, input.len() as u64);
    log_savings(verdict.total() as usize, input.len());

    Ok(RunOutput {
        bytes: outcome.candidate,
        disposition: Disposition::Optimized {
            quality: outcome.quality,
            score: outcome.score,
        },
    })
}

fn search<C: CodecAdapter>(
    codec: &C,
    source: &DecodedInput,
    search: &SearchConfig,
    variant: Variant,
) -> EngineResult<SearchOutcome> {
    let target = search.resolved_target(variant);
    debug!(
        codec = codec.format(),
        metric = %search.metric,
        target,
        min = search.min_quality,
        max = search.max_quality,
        attempts = search.attempts,
        "starting quality search"
    );
    let outcome = bisect(codec, &source.image, search.metric.evaluator(), target, search)?;
    info!(
        quality = outcome.quality,
        score = outcome.score,
        trials = outcome.trials.len(),
        "Final optimized {} at q={}",
        search.metric,
        outcome.quality
    );
    Ok(outcome)
}

fn log_savings(output_len: usize, input_len: usize) {
    let percent = output_len as f64 * 100.0 / input_len.max(1) as f64;
    let saved_kb = input_len.saturating_sub(output_len) / 1024;
    info!(
        output_len,
        input_len,
        "New size is {:.0}% of original (saved {} kb)",
        percent,
        saved_kb
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputPolicy, QualityPreset, TargetQuality};
    use crate::metadata::segments::SOI;

    fn ppm(width: u32, height: u32) -> Vec<u8> {
        let mut out = format!("P6\n{width} {height}\n255\n").into_bytes();
        for y in 0..height {
            for x in 0..width {
                out.extend_from_slice(&[(x * 7) as u8, (y * 5) as u8, ((x ^ y) * 3) as u8]);
            }
        }
        out
    }

    #[test]
    fn test_load_source_without_lens_keeps_pixels() {
        let input = ppm(12, 8);
        let plain = decode_input(&input, InputFormat::Ppm).unwrap();
        let loaded = load_source(&input, InputFormat::Auto, &LensCorrection::default()).unwrap();
        assert_eq!(loaded.format, ImageFormat::Pnm);
        assert_eq!(loaded.image.rgb(), plain.image.rgb());
    }

    #[test]
    fn test_load_source_applies_lens() {
        let input = ppm(32, 24);
        let lens = LensCorrection {
            strength: 2.5,
            zoom: 1.0,
        };
        let plain = load_source(&input, InputFormat::Ppm, &LensCorrection::default()).unwrap();
        let corrected = load_source(&input, InputFormat::Ppm, &lens).unwrap();
        assert_eq!(corrected.image.width(), 32);
        assert_eq!(corrected.image.height(), 24);
        assert_ne!(corrected.image.rgb(), plain.image.rgb());
    }

    #[test]
    fn test_ppm_source_has_no_metadata_to_carry() {
        let config = RecompressConfig {
            search: SearchConfig {
                target: TargetQuality::Preset(QualityPreset::Low),
                ..SearchConfig::default()
            },
            ..RecompressConfig::default()
        };
        let output = recompress_jpeg(&ppm(48, 32), &config).unwrap();
        assert!(!output.is_copy());
        assert_eq!(output.bytes[1], SOI);
        let block = scan_metadata(&output.bytes, JPEG_SIGNATURE.as_bytes()).unwrap();
        assert!(block.already_processed());
        assert!(block.is_empty());
    }

    #[test]
    fn test_invalid_config_fails_before_decoding() {
        let config = RecompressConfig {
            policy: OutputPolicy::default(),
            search: SearchConfig {
                attempts: 0,
                ..SearchConfig::default()
            },
            ..RecompressConfig::default()
        };
        // Not an image at all; the usage error must win
        let err = recompress_jpeg(b"nope", &config).unwrap_err();
        assert_eq!(err.exit_code(), 255);
    }

    #[test]
    fn test_run_output_copy_flag() {
        let copied = RunOutput::copied(b"abc", Disposition::CopiedNoSavings);
        assert!(copied.is_copy());
        assert_eq!(copied.bytes, b"abc");
        let optimized = RunOutput {
            bytes: Vec::new(),
            disposition: Disposition::Optimized {
                quality: 80,
                score: 0.9999,
            },
        };
        assert!(!optimized.is_copy());
    }
}
