//! Error types for the pixelwash sanitization pipeline.
//!
//! Decode failures are ordinary values here: the pipeline pattern-matches on
//! [`DecodeError`] to decide whether to fall back, opt out or report. Only
//! harness-level problems (missing files, timeouts, writes) become
//! [`PipelineError`].

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pixelwash operations.
#[derive(Error, Debug)]
pub enum PixelwashError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline harness errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Classification of a failed decode attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The container was not identified as an image at all.
    #[error("unrecognized image data")]
    Unrecognized,

    /// The container was identified but pixel or mode conversion failed.
    #[error("{0}")]
    Malformed(String),

    /// The fallback decoder could not produce an image either.
    #[error("fallback decoder could not sanitize the image")]
    FallbackExhausted,
}

/// Harness errors around a single sanitization run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input file could not be read
    #[error("Cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// Sanitized artifact could not be written
    #[error("Cannot write artifact to {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// The blocking sanitize task panicked or was cancelled
    #[error("Sanitize task failed for {path}: {message}")]
    Task { path: PathBuf, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for pixelwash results.
pub type Result<T> = std::result::Result<T, PixelwashError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
