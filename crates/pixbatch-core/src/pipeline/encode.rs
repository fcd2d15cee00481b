//! JPEG output encoding.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::PipelineError;

/// Encode an image as JPEG and write it to `path`.
///
/// The image is normalized to RGB8 first; JPEG has no alpha channel, so
/// callers that may hold transparency should flatten before encoding.
pub fn write_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::Encode {
        path: path.to_path_buf(),
        message: format!("Cannot create output file: {}", e),
    })?;

    let rgb = img.to_rgb8();
    let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| PipelineError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
