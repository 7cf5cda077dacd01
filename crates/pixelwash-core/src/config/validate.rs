//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sanitize.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "sanitize.max_dimension must be > 0".into(),
            ));
        }
        if self.sanitize.max_value_length == 0 {
            return Err(ConfigError::ValidationError(
                "sanitize.max_value_length must be > 0".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_input_dimension < self.sanitize.max_dimension {
            return Err(ConfigError::ValidationError(
                "limits.max_input_dimension must be >= sanitize.max_dimension".into(),
            ));
        }
        if self.limits.max_decode_alloc_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_decode_alloc_mb must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if !matches!(self.output.format.as_str(), "json" | "jsonl") {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be \"json\" or \"jsonl\", got {:?}",
                self.output.format
            )));
        }
        Ok(())
    }
}
