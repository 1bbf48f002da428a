//! Configuration validation.

use crate::error::ConfigError;

use super::Config;

const OUTPUT_FORMATS: &[&str] = &["text", "json", "jsonl"];
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];
const LOG_FORMATS: &[&str] = &["pretty", "json"];

impl Config {
    /// Validate configuration values.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.progress_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.progress_buffer must be > 0".into(),
            ));
        }
        if self.clean.output_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "clean.output_dir must not be empty".into(),
            ));
        }
        if !OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be one of {}",
                OUTPUT_FORMATS.join(", ")
            )));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}
