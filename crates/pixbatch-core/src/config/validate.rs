//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.processing.crop_ratio <= 0.0 || self.processing.crop_ratio > 1.0 {
            return Err(ConfigError::ValidationError(
                "processing.crop_ratio must be in (0, 1]".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.output.jpeg_quality == 0 || self.output.jpeg_quality > 100 {
            return Err(ConfigError::ValidationError(
                "output.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.output.processed_dir.is_empty() || self.output.temp_crop_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "output directory names must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_quality_rejected() {
        let mut config = Config::default();
        config.output.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ratio_bounds() {
        let mut config = Config::default();
        config.processing.crop_ratio = 0.0;
        assert!(config.validate().is_err());
        config.processing.crop_ratio = 1.0;
        assert!(config.validate().is_ok());
    }
}
