//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Discovery and transform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// File extensions treated as images (matched case-insensitively)
    pub supported_formats: Vec<String>,

    /// Fraction of the shorter side kept by the centered square crop
    pub crop_ratio: f64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "bmp".to_string(),
                "gif".to_string(),
                "tiff".to_string(),
                "webp".to_string(),
            ],
            crop_ratio: 0.88,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height), for both inputs
    /// and requested output sizes
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Output naming and encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Name of the persistent output root created under the source folder
    pub processed_dir: String,

    /// Name of the transient directory used between the crop and resize passes
    pub temp_crop_dir: String,

    /// JPEG encode quality (1-100)
    pub jpeg_quality: u8,

    /// Where per-item failures are appended
    pub error_log: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            processed_dir: "Processed".to_string(),
            temp_crop_dir: "Cropped_Temp_Images".to_string(),
            jpeg_quality: 90,
            error_log: PathBuf::from("error_log.txt"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Log format ("pretty" or "json")
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
