//! Semantic validation of a loaded configuration.
//!
//! Deserialization only checks shapes; the rules here reject values that
//! would make the router misbehave at runtime.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatchConfig, LogOutput, LoggingConfig, SiftConfig};
use sift_core::SimilarityOptions;

/// Validates the complete configuration.
pub fn validate_config(config: &SiftConfig) -> ConfigResult<()> {
    validate_logging(&config.logging)?;
    validate_similarity(&config.similarity)?;
    validate_dispatch(&config.dispatch)?;
    Ok(())
}

fn validate_logging(config: &LoggingConfig) -> ConfigResult<()> {
    if config.output == LogOutput::File && config.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }
    if config.filters.keys().any(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation(
            "logging.filters contains an empty target",
        ));
    }
    Ok(())
}

fn validate_similarity(options: &SimilarityOptions) -> ConfigResult<()> {
    if !(0.0..=1.0).contains(&options.threshold) {
        return Err(ConfigError::validation(format!(
            "similarity.threshold must be within [0, 1], got {}",
            options.threshold
        )));
    }
    Ok(())
}

fn validate_dispatch(config: &DispatchConfig) -> ConfigResult<()> {
    if config.composite_depth_limit == 0 {
        return Err(ConfigError::validation(
            "dispatch.composite_depth_limit must be at least 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SiftConfig::default()).is_ok());
    }

    #[test]
    fn test_threshold_bounds() {
        let mut config = SiftConfig::default();
        for threshold in [0.0, 1.0] {
            config.similarity.threshold = threshold;
            assert!(validate_config(&config).is_ok());
        }
        for threshold in [-0.1, 1.01, f64::NAN] {
            config.similarity.threshold = threshold;
            assert!(matches!(
                validate_config(&config),
                Err(ConfigError::ValidationError { .. })
            ));
        }
    }

    #[test]
    fn test_zero_depth_limit_rejected() {
        let mut config = SiftConfig::default();
        config.dispatch.composite_depth_limit = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = SiftConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("logs/sift.log"));
        assert!(validate_config(&config).is_ok());
    }
}
