// src/config.rs
//
// Run configuration. Built once (usually from the command line), then passed
// by reference into the search, the size guard and the splicer.

use crate::error::{RecompressError, Result};
use crate::metrics::Metric;

/// Number of bytes the optimized output must save before it is worth writing.
pub const MIN_SIZE_DELTA: u64 = 10;

pub const DEFAULT_MIN_QUALITY: u8 = 1;
pub const DEFAULT_MAX_QUALITY: u8 = 99;
pub const DEFAULT_ATTEMPTS: u32 = 8;

/// Which output a run produces. Preset targets differ between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// JPEG in, JPEG out, metadata preserved.
    Reencode,
    /// Any supported input, WebP out.
    Convert,
}

/// Named quality levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl QualityPreset {
    /// Numeric target for `metric` under this preset.
    ///
    /// Only SSIM depends on the variant.
    pub fn target(self, metric: Metric, variant: Variant) -> f64 {
        use QualityPreset::*;
        match metric {
            Metric::Ssim => match (variant, self) {
                (Variant::Reencode, Low) => 0.999,
                (Variant::Reencode, Medium) => 0.9999,
                (Variant::Reencode, High) => 0.99995,
                (Variant::Reencode, VeryHigh) => 0.99999,
                (Variant::Convert, Low) => 0.995,
                (Variant::Convert, Medium) => 0.999,
                (Variant::Convert, High) => 0.9995,
                (Variant::Convert, VeryHigh) => 0.9999,
            },
            Metric::MsSsim => match self {
                Low => 0.85,
                Medium => 0.94,
                High => 0.96,
                VeryHigh => 0.98,
            },
            Metric::Smallfry => match self {
                Low => 100.75,
                Medium => 102.25,
                High => 103.8,
                VeryHigh => 105.5,
            },
            Metric::Mpe => match self {
                Low => 1.5,
                Medium => 1.0,
                High => 0.8,
                VeryHigh => 0.6,
            },
        }
    }
}

/// Either an explicit metric value or a preset to derive one from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetQuality {
    Explicit(f64),
    Preset(QualityPreset),
}

impl Default for TargetQuality {
    fn default() -> Self {
        TargetQuality::Preset(QualityPreset::default())
    }
}

impl TargetQuality {
    /// An explicit target of exactly zero means "not given".
    pub fn from_parts(explicit: Option<f64>, preset: QualityPreset) -> Self {
        match explicit {
            Some(value) if value != 0.0 => TargetQuality::Explicit(value),
            _ => TargetQuality::Preset(preset),
        }
    }

    pub fn resolve(&self, metric: Metric, variant: Variant) -> f64 {
        match self {
            TargetQuality::Explicit(value) => *value,
            TargetQuality::Preset(preset) => preset.target(metric, variant),
        }
    }
}

/// Parameters of the quality bisection.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub min_quality: u8,
    pub max_quality: u8,
    pub attempts: u32,
    pub metric: Metric,
    pub target: TargetQuality,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_quality: DEFAULT_MIN_QUALITY,
            max_quality: DEFAULT_MAX_QUALITY,
            attempts: DEFAULT_ATTEMPTS,
            metric: Metric::Ssim,
            target: TargetQuality::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.min_quality) {
            return Err(RecompressError::invalid_argument(
                "min",
                self.min_quality.to_string(),
                "quality must be between 1 and 100",
            ));
        }
        if !(1..=100).contains(&self.max_quality) {
            return Err(RecompressError::invalid_argument(
                "max",
                self.max_quality.to_string(),
                "quality must be between 1 and 100",
            ));
        }
        if self.min_quality > self.max_quality {
            return Err(RecompressError::invalid_argument(
                "max",
                self.max_quality.to_string(),
                "maximum quality must not be smaller than minimum quality",
            ));
        }
        if self.attempts == 0 {
            return Err(RecompressError::invalid_argument(
                "loops",
                "0",
                "at least one attempt is required",
            ));
        }
        if let TargetQuality::Explicit(value) = self.target {
            if !value.is_finite() || value < 0.0 {
                return Err(RecompressError::invalid_argument(
                    "target",
                    value.to_string(),
                    "target must be a finite, non-negative number",
                ));
            }
        }
        Ok(())
    }

    pub fn resolved_target(&self, variant: Variant) -> f64 {
        self.target.resolve(self.metric, variant)
    }
}

/// What to do with the result once the search is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPolicy {
    pub strip_metadata: bool,
    /// Emit the input unchanged instead of failing when it cannot be improved.
    pub copy_through: bool,
    pub min_delta: u64,
}

impl Default for OutputPolicy {
    fn default() -> Self {
        Self {
            strip_metadata: false,
            copy_through: true,
            min_delta: MIN_SIZE_DELTA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subsampling {
    /// 4:2:0
    #[default]
    Default,
    /// 4:4:4
    Disabled,
}

/// JPEG encoder knobs. None of them change the search protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegOptions {
    pub subsampling: Subsampling,
    /// Progressive scans on the final encode.
    pub progressive: bool,
    /// Optimize Huffman tables on every trial, not just the final one.
    pub accurate: bool,
}

impl Default for JpegOptions {
    fn default() -> Self {
        Self {
            subsampling: Subsampling::Default,
            progressive: true,
            accurate: false,
        }
    }
}

/// Fisheye correction applied to the decoded input. Strength 0 disables it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensCorrection {
    pub strength: f32,
    pub zoom: f32,
}

impl Default for LensCorrection {
    fn default() -> Self {
        Self {
            strength: 0.0,
            zoom: 1.0,
        }
    }
}

impl LensCorrection {
    pub fn is_enabled(&self) -> bool {
        self.strength != 0.0
    }

    pub fn validate(&self) -> Result<()> {
        if !self.strength.is_finite() {
            return Err(RecompressError::invalid_argument(
                "defish",
                self.strength.to_string(),
                "strength must be a finite number",
            ));
        }
        if !self.zoom.is_finite() {
            return Err(RecompressError::invalid_argument(
                "zoom",
                self.zoom.to_string(),
                "zoom must be a finite number",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Auto,
    Jpeg,
    Ppm,
}

/// Everything the JPEG re-encode variant needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecompressConfig {
    pub search: SearchConfig,
    pub policy: OutputPolicy,
    pub jpeg: JpegOptions,
    pub lens: LensCorrection,
    pub input_format: InputFormat,
}

impl RecompressConfig {
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.lens.validate()
    }
}

/// Everything the WebP conversion variant needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConvertConfig {
    pub search: SearchConfig,
    pub lens: LensCorrection,
    pub input_format: InputFormat,
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.lens.validate()
    }
}
