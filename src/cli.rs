// src/cli.rs
//
// Command line front end shared by the jpeg-recompress and archive2webp
// binaries: argument parsing, logging setup, exit codes.

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Args, Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::{
    ConvertConfig, InputFormat, JpegOptions, LensCorrection, OutputPolicy, QualityPreset,
    RecompressConfig, SearchConfig, Subsampling, TargetQuality, DEFAULT_ATTEMPTS,
    DEFAULT_MAX_QUALITY, DEFAULT_MIN_QUALITY,
};
use crate::engine::{convert_to_webp, read_input, recompress_jpeg, write_output};
use crate::error::Result;
use crate::metrics::Metric;

/// Exit code for anything clap rejects.
const USAGE_EXIT_CODE: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    Low,
    Medium,
    High,
    #[value(name = "veryhigh", alias = "very-high")]
    VeryHigh,
}

impl From<PresetArg> for QualityPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Low => QualityPreset::Low,
            PresetArg::Medium => QualityPreset::Medium,
            PresetArg::High => QualityPreset::High,
            PresetArg::VeryHigh => QualityPreset::VeryHigh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Ssim,
    MsSsim,
    Smallfry,
    Mpe,
}

impl From<MethodArg> for Metric {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Ssim => Metric::Ssim,
            MethodArg::MsSsim => Metric::MsSsim,
            MethodArg::Smallfry => Metric::Smallfry,
            MethodArg::Mpe => Metric::Mpe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SubsampleArg {
    /// 4:2:0
    Default,
    /// 4:4:4
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileTypeArg {
    Auto,
    Jpeg,
    Ppm,
}

/// Quality search options, common to both tools.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Metric target value; 0 uses the preset
    #[arg(short = 't', long = "target")]
    pub target: Option<f64>,

    /// Quality preset
    #[arg(short = 'q', long = "quality", value_enum, default_value_t = PresetArg::Medium)]
    pub preset: PresetArg,

    /// Minimum encoder quality
    #[arg(
        short = 'n',
        long = "min",
        default_value_t = DEFAULT_MIN_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub min: u8,

    /// Maximum encoder quality
    #[arg(
        short = 'x',
        long = "max",
        default_value_t = DEFAULT_MAX_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub max: u8,

    /// Number of search attempts
    #[arg(
        short = 'l',
        long = "loops",
        default_value_t = DEFAULT_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub loops: u32,

    /// Comparison metric
    #[arg(short = 'm', long = "method", value_enum, default_value_t = MethodArg::Ssim)]
    pub method: MethodArg,
}

impl SearchArgs {
    pub fn to_config(&self) -> Result<SearchConfig> {
        let config = SearchConfig {
            min_quality: self.min,
            max_quality: self.max,
            attempts: self.loops,
            metric: self.method.into(),
            target: TargetQuality::from_parts(self.target, self.preset.into()),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Source handling and paths, common to both tools.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Fisheye correction strength (0 disables)
    #[arg(short = 'd', long = "defish", default_value_t = 0.0)]
    pub defish: f32,

    /// Zoom applied with --defish
    #[arg(short = 'z', long = "zoom", default_value_t = 1.0)]
    pub zoom: f32,

    /// Input is PPM (same as --input-filetype ppm)
    #[arg(short = 'r', long = "ppm", conflicts_with = "input_filetype")]
    pub ppm: bool,

    /// Input file type
    #[arg(short = 'T', long = "input-filetype", value_enum, default_value_t = FileTypeArg::Auto)]
    pub input_filetype: FileTypeArg,

    /// Only print errors
    #[arg(short = 'Q', long = "quiet")]
    pub quiet: bool,

    /// Input file, or - for stdin
    pub input: String,

    /// Output file, or - for stdout
    pub output: String,
}

impl InputArgs {
    pub fn lens(&self) -> Result<LensCorrection> {
        let lens = LensCorrection {
            strength: self.defish,
            zoom: self.zoom,
        };
        lens.validate()?;
        Ok(lens)
    }

    pub fn input_format(&self) -> InputFormat {
        if self.ppm {
            return InputFormat::Ppm;
        }
        match self.input_filetype {
            FileTypeArg::Auto => InputFormat::Auto,
            FileTypeArg::Jpeg => InputFormat::Jpeg,
            FileTypeArg::Ppm => InputFormat::Ppm,
        }
    }
}

/// Recompress a JPEG to the smallest size that keeps the target quality.
#[derive(Debug, Clone, Parser)]
#[command(name = "jpeg-recompress", version, about)]
pub struct JpegRecompressArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Optimize Huffman tables on every attempt (slower)
    #[arg(short = 'a', long = "accurate")]
    pub accurate: bool,

    /// Strip metadata
    #[arg(short = 's', long = "strip")]
    pub strip: bool,

    /// Fail instead of copying the input when it cannot be improved
    #[arg(short = 'c', long = "no-copy")]
    pub no_copy: bool,

    /// Write baseline instead of progressive JPEG
    #[arg(short = 'p', long = "no-progressive")]
    pub no_progressive: bool,

    /// Chroma subsampling
    #[arg(short = 'S', long = "subsample", value_enum, default_value_t = SubsampleArg::Default)]
    pub subsample: SubsampleArg,

    #[command(flatten)]
    pub io: InputArgs,
}

impl JpegRecompressArgs {
    pub fn to_config(&self) -> Result<RecompressConfig> {
        Ok(RecompressConfig {
            search: self.search.to_config()?,
            policy: OutputPolicy {
                strip_metadata: self.strip,
                copy_through: !self.no_copy,
                ..OutputPolicy::default()
            },
            jpeg: JpegOptions {
                subsampling: match self.subsample {
                    SubsampleArg::Default => Subsampling::Default,
                    SubsampleArg::Disable => Subsampling::Disabled,
                },
                progressive: !self.no_progressive,
                accurate: self.accurate,
            },
            lens: self.io.lens()?,
            input_format: self.io.input_format(),
        })
    }
}

/// Convert an image to WebP at the smallest size that keeps the target quality.
#[derive(Debug, Clone, Parser)]
#[command(name = "archive2webp", version, about)]
pub struct ArchiveToWebpArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    #[command(flatten)]
    pub io: InputArgs,
}

impl ArchiveToWebpArgs {
    pub fn to_config(&self) -> Result<ConvertConfig> {
        Ok(ConvertConfig {
            search: self.search.to_config()?,
            lens: self.io.lens()?,
            input_format: self.io.input_format(),
        })
    }
}

/// Parse the process arguments. Help and version exit 0, anything else clap
/// rejects is a usage error.
pub fn parse_args<P: Parser>() -> std::result::Result<P, ExitCode> {
    P::try_parse().map_err(|err| {
        // Printing can only fail if stderr is gone
        let _ = err.print();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
            _ => ExitCode::from(USAGE_EXIT_CODE),
        }
    })
}

/// stderr logging; `RUST_LOG` wins unless `quiet` is set.
pub fn init_logging(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // A subscriber may already be installed (tests); keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

pub fn run_jpeg_recompress(args: &JpegRecompressArgs) -> Result<()> {
    let config = args.to_config()?;
    let input = read_input(&args.io.input)?;
    let output = recompress_jpeg(&input, &config)?;
    write_output(&args.io.output, &output.bytes)
}

pub fn run_archive_to_webp(args: &ArchiveToWebpArgs) -> Result<()> {
    let config = args.to_config()?;
    let input = read_input(&args.io.input)?;
    let output = convert_to_webp(&input, &config)?;
    write_output(&args.io.output, &output.bytes)
}

/// Log a failure and turn it into the process exit code.
pub fn finish(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(category = err.category().as_str(), "{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_args(extra: &[&str]) -> std::result::Result<JpegRecompressArgs, clap::Error> {
        let mut argv = vec!["jpeg-recompress"];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(&["in.jpg", "out.jpg"]);
        JpegRecompressArgs::try_parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = jpeg_args(&[]).unwrap().to_config().unwrap();
        assert_eq!(config, RecompressConfig::default());
    }

    #[test]
    fn test_short_flags() {
        let args = jpeg_args(&[
            "-t", "0.995", "-n", "40", "-x", "95", "-l", "6", "-m", "ms-ssim", "-a", "-s", "-c",
            "-p", "-S", "disable", "-Q",
        ])
        .unwrap();
        assert!(args.io.quiet);
        let config = args.to_config().unwrap();
        assert_eq!(config.search.min_quality, 40);
        assert_eq!(config.search.max_quality, 95);
        assert_eq!(config.search.attempts, 6);
        assert_eq!(config.search.metric, Metric::MsSsim);
        assert_eq!(config.search.target, TargetQuality::Explicit(0.995));
        assert!(config.policy.strip_metadata);
        assert!(!config.policy.copy_through);
        assert!(!config.jpeg.progressive);
        assert!(config.jpeg.accurate);
        assert_eq!(config.jpeg.subsampling, Subsampling::Disabled);
    }

    #[test]
    fn test_preset_names() {
        let args = jpeg_args(&["--quality", "veryhigh"]).unwrap();
        assert_eq!(args.search.preset, PresetArg::VeryHigh);
        assert!(jpeg_args(&["-q", "ultra"]).is_err());
    }

    #[test]
    fn test_zero_target_means_preset() {
        let config = jpeg_args(&["-t", "0", "-q", "low"]).unwrap().to_config().unwrap();
        assert_eq!(config.search.target, TargetQuality::Preset(QualityPreset::Low));
    }

    #[test]
    fn test_out_of_range_quality_is_usage_error() {
        let err = jpeg_args(&["-n", "0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(jpeg_args(&["-x", "101"]).is_err());
        assert!(jpeg_args(&["-l", "0"]).is_err());
    }

    #[test]
    fn test_inverted_bounds_are_usage_error() {
        let err = jpeg_args(&["-n", "80", "-x", "20"])
            .unwrap()
            .to_config()
            .unwrap_err();
        assert_eq!(err.exit_code(), 255);
    }

    #[test]
    fn test_ppm_conflicts_with_filetype() {
        assert_eq!(
            jpeg_args(&["-r"]).unwrap().io.input_format(),
            InputFormat::Ppm
        );
        assert_eq!(
            jpeg_args(&["-T", "jpeg"]).unwrap().io.input_format(),
            InputFormat::Jpeg
        );
        let err = jpeg_args(&["-r", "-T", "jpeg"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_missing_paths_is_error() {
        assert!(JpegRecompressArgs::try_parse_from(["jpeg-recompress", "in.jpg"]).is_err());
    }

    #[test]
    fn test_webp_args() {
        let args = ArchiveToWebpArgs::try_parse_from([
            "archive2webp",
            "-m",
            "smallfry",
            "-d",
            "2.5",
            "-z",
            "1.2",
            "in.ppm",
            "-",
        ])
        .unwrap();
        let config = args.to_config().unwrap();
        assert_eq!(config.search.metric, Metric::Smallfry);
        assert!(config.lens.is_enabled());
        assert_eq!(config.lens.zoom, 1.2);
        assert_eq!(args.io.output, "-");
        // Re-encode-only flags do not exist here
        assert!(ArchiveToWebpArgs::try_parse_from(["archive2webp", "-s", "a", "b"]).is_err());
    }

    #[test]
    fn test_non_finite_lens_is_usage_error() {
        let args = jpeg_args(&["--defish", "NaN"]).unwrap();
        assert_eq!(args.to_config().unwrap_err().exit_code(), USAGE_EXIT_CODE);
        let args =
            ArchiveToWebpArgs::try_parse_from(["archive2webp", "-z", "inf", "a", "b"]).unwrap();
        assert_eq!(args.to_config().unwrap_err().exit_code(), USAGE_EXIT_CODE);
    }

    #[test]
    fn test_finish_exit_codes() {
        assert_eq!(finish(Ok(())), ExitCode::SUCCESS);
        assert_eq!(
            finish(Err(crate::error::RecompressError::already_processed("x"))),
            ExitCode::from(2)
        );
    }
}
