// src/error.rs
//
// Unified error handling for recompress
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy (maps 1:1 onto process exit codes):
// - Usage: bad or missing arguments (255)
// - Input: unreadable or undecodable source (1)
// - Codec: encode/decode failure inside the search (1)
// - AlreadyProcessed: input carries our signature (2, unless copied through)
// - SizeRegression: optimized output would not be smaller (1, unless copied through)
// - CorruptOutput: assembled output failed structural checks (1)
// - OutputWrite: destination unwritable or short write (1)
// - Internal: library bugs (should not happen) (1)

use std::borrow::Cow;
use thiserror::Error;

/// Error category, used to pick the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Usage,
    Input,
    Codec,
    AlreadyProcessed,
    SizeRegression,
    CorruptOutput,
    OutputWrite,
    Internal,
}

impl ErrorCategory {
    /// Process exit code for this category.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorCategory::Usage => 255,
            ErrorCategory::AlreadyProcessed => 2,
            ErrorCategory::Input
            | ErrorCategory::Codec
            | ErrorCategory::SizeRegression
            | ErrorCategory::CorruptOutput
            | ErrorCategory::OutputWrite
            | ErrorCategory::Internal => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Usage => "UsageError",
            ErrorCategory::Input => "InputError",
            ErrorCategory::Codec => "CodecError",
            ErrorCategory::AlreadyProcessed => "AlreadyProcessedError",
            ErrorCategory::SizeRegression => "SizeRegressionError",
            ErrorCategory::CorruptOutput => "CorruptOutputError",
            ErrorCategory::OutputWrite => "OutputWriteError",
            ErrorCategory::Internal => "InternalError",
        }
    }
}

/// recompress error types
#[derive(Debug, Error)]
pub enum RecompressError {
    // Usage Errors
    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    // Input Errors
    #[error("Failed to read file '{path}': {source}")]
    FileReadFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("Malformed JPEG at offset {offset}: {reason}")]
    MalformedJpeg {
        offset: usize,
        reason: Cow<'static, str>,
    },

    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    // Codec Errors
    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Unable to decode {format} candidate that was just encoded: {message}")]
    CandidateDecodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Plane dimensions differ: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    // Policy Errors
    #[error("File already processed by {tool}")]
    AlreadyProcessed { tool: Cow<'static, str> },

    #[error("Output file would be larger than input ({optimized} bytes vs {original} bytes)")]
    SizeRegression { optimized: u64, original: u64 },

    // Output Errors
    #[error("Refusing to write corrupt output: {reason}")]
    CorruptOutput { reason: Cow<'static, str> },

    #[error("Failed to write file '{path}': {source}")]
    FileWriteFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    // Internal Errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl RecompressError {
    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn file_read_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn malformed_jpeg(offset: usize, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedJpeg {
            offset,
            reason: reason.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn candidate_decode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::CandidateDecodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn dimension_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn already_processed(tool: impl Into<Cow<'static, str>>) -> Self {
        Self::AlreadyProcessed { tool: tool.into() }
    }

    pub fn size_regression(optimized: u64, original: u64) -> Self {
        Self::SizeRegression {
            optimized,
            original,
        }
    }

    pub fn corrupt_output(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::CorruptOutput {
            reason: reason.into(),
        }
    }

    pub fn file_write_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileWriteFailed {
            path: path.into(),
            source,
        }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::Usage,

            Self::FileReadFailed { .. }
            | Self::UnsupportedFormat { .. }
            | Self::DecodeFailed { .. }
            | Self::MalformedJpeg { .. }
            | Self::DimensionExceedsLimit { .. } => ErrorCategory::Input,

            // A mismatch can only come from a codec handing back a plane of
            // the wrong size, so it is reported alongside codec failures.
            Self::EncodeFailed { .. }
            | Self::CandidateDecodeFailed { .. }
            | Self::DimensionMismatch { .. } => ErrorCategory::Codec,

            Self::AlreadyProcessed { .. } => ErrorCategory::AlreadyProcessed,
            Self::SizeRegression { .. } => ErrorCategory::SizeRegression,
            Self::CorruptOutput { .. } => ErrorCategory::CorruptOutput,
            Self::FileWriteFailed { .. } => ErrorCategory::OutputWrite,
            Self::InternalPanic { .. } => ErrorCategory::Internal,
        }
    }

    /// Shortcut for `self.category().exit_code()`.
    pub fn exit_code(&self) -> u8 {
        self.category().exit_code()
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, RecompressError>;
