//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};

/// Sanitization policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Largest width or height an emitted PNG may have
    pub max_dimension: u32,

    /// Maximum length (in characters) of reported description text
    pub max_value_length: usize,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            max_dimension: 512,
            max_value_length: 4000,
        }
    }
}

/// Resource limits to protect against hostile inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum input file size in megabytes
    pub max_file_size_mb: u64,

    /// Largest width or height a decoder is allowed to materialize
    pub max_input_dimension: u32,

    /// Decoder allocation budget in megabytes
    pub max_decode_alloc_mb: u64,

    /// Wall-clock budget for one sanitization run in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_input_dimension: 16384,
            max_decode_alloc_mb: 512,
            decode_timeout_ms: 30000,
        }
    }
}

impl LimitsConfig {
    /// Allocation budget in bytes.
    pub fn max_decode_alloc_bytes(&self) -> u64 {
        self.max_decode_alloc_mb.saturating_mul(1024 * 1024)
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory sanitized PNGs are written to (supports `~`)
    pub dir: String,

    /// Default report format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON reports
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "~/.pixelwash/safe".to_string(),
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
