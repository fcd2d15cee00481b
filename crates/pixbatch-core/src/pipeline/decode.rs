//! Image decoding with format detection, size limits, and timeout support.

use image::DynamicImage;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image decoder with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an image from disk with validation and timeout.
    ///
    /// The actual decode runs in `spawn_blocking` so a pathological file
    /// cannot wedge the runtime; the timeout comes from
    /// `limits.decode_timeout_ms`.
    pub async fn decode(&self, path: &Path) -> Result<DynamicImage, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;
        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let path_owned = path.to_path_buf();
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        let decode_result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || Self::decode_sync(&path_owned)).await
        })
        .await;

        let image = match decode_result {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => {
                return Err(PipelineError::Decode {
                    path: path.to_path_buf(),
                    message: format!("Task join error: {}", e),
                })
            }
            Err(_) => {
                return Err(PipelineError::Timeout {
                    path: path.to_path_buf(),
                    timeout_ms: self.limits.decode_timeout_ms,
                })
            }
        };

        let (width, height) = (image.width(), image.height());
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        Ok(image)
    }

    /// Synchronous decode (runs in spawn_blocking). Format is sniffed from
    /// content, so a PNG saved with a .jpg extension still decodes.
    fn decode_sync(path: &Path) -> Result<DynamicImage, PipelineError> {
        let reader = image::ImageReader::open(path)
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot open file: {}", e),
            })?
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;

        reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([10, 20, 30]),
        ));
        img.save_with_format(path, image::ImageFormat::Png).unwrap();
    }

    #[tokio::test]
    async fn test_decode_valid_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path, 40, 30);

        let decoder = ImageDecoder::new(LimitsConfig::default());
        let img = decoder.decode(&path).await.unwrap();
        assert_eq!((img.width(), img.height()), (40, 30));
    }

    #[tokio::test]
    async fn test_decode_sniffs_misnamed_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_png.jpg");
        write_png(&path, 8, 8);

        let decoder = ImageDecoder::new(LimitsConfig::default());
        assert!(decoder.decode(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_decode_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"this is not a png").unwrap();

        let decoder = ImageDecoder::new(LimitsConfig::default());
        let err = decoder.decode(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_decode_rejects_oversized_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        write_png(&path, 64, 64);

        let limits = LimitsConfig {
            max_image_dimension: 32,
            ..Default::default()
        };
        let decoder = ImageDecoder::new(limits);
        let err = decoder.decode(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_decode_missing_file() {
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let err = decoder.decode(Path::new("/nonexistent/x.png")).await;
        assert!(matches!(err, Err(PipelineError::FileNotFound(_))));
    }
}
