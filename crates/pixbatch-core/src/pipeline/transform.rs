//! Pure image transforms: flatten, centered square crop, exact resize.
//!
//! Each transform takes a decoded image and produces another; a batch pass
//! applies an ordered list of [`TransformSpec`]s to every item before the
//! JPEG write.

use image::{imageops::FilterType, DynamicImage, RgbImage};

/// Fraction of the shorter side kept by the default square crop.
pub const DEFAULT_CROP_RATIO: f64 = 0.88;

/// One transform step applied to a decoded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformSpec {
    /// Composite transparency onto an opaque white background
    Flatten,
    /// Centered square crop; side = shorter dimension * ratio, ratio in (0, 1]
    CropSquare { ratio: f64 },
    /// Stretch to exact dimensions, aspect ratio not preserved
    Resize { width: u32, height: u32 },
}

/// Apply a single transform step.
pub fn apply(img: DynamicImage, spec: &TransformSpec) -> DynamicImage {
    match *spec {
        TransformSpec::Flatten => flatten_to_white(img),
        TransformSpec::CropSquare { ratio } => crop_center_square(&img, ratio),
        TransformSpec::Resize { width, height } => resize_exact(&img, width, height),
    }
}

/// Apply an ordered list of transform steps.
pub fn apply_all(mut img: DynamicImage, specs: &[TransformSpec]) -> DynamicImage {
    for spec in specs {
        img = apply(img, spec);
    }
    img
}

/// Composite a possibly-transparent image over an opaque white canvas,
/// using the alpha channel as the blend mask.
///
/// Images without an alpha channel pass through unchanged in color; the
/// result is always RGB8, so JPEG encoding never sees transparency.
pub fn flatten_to_white(img: DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return DynamicImage::ImageRgb8(img.to_rgb8());
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let a = u32::from(src[3]);
        for c in 0..3 {
            let fg = u32::from(src[c]);
            // out = fg * a + white * (1 - a), rounded
            dst[c] = ((fg * a + 255 * (255 - a) + 127) / 255) as u8;
        }
    }
    DynamicImage::ImageRgb8(out)
}

/// Crop a centered square whose side is `min(width, height) * ratio`.
///
/// The box is computed in floating point (`left = (w - s) / 2`, ...) and
/// rounded to whole pixels, so results land within one pixel of the exact
/// float box.
pub fn crop_center_square(img: &DynamicImage, ratio: f64) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let shorter = w.min(h);
    let side_f = f64::from(shorter) * ratio;
    let side = (side_f.round() as u32).clamp(1, shorter);
    let left = (((f64::from(w) - side_f) / 2.0).round() as u32).min(w - side);
    let top = (((f64::from(h) - side_f) / 2.0).round() as u32).min(h - side);
    img.crop_imm(left, top, side, side)
}

/// Resize to exact target dimensions with Lanczos3 resampling.
///
/// Aspect ratio is not preserved; any non-RGB color mode (grayscale, RGBA,
/// palette) is normalized to three-channel color first.
pub fn resize_exact(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.resize_exact(width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn test_crop_ratio_on_square_image() {
        let img = DynamicImage::new_rgb8(1000, 1000);
        let cropped = crop_center_square(&img, DEFAULT_CROP_RATIO);
        assert_eq!(cropped.dimensions(), (880, 880));
    }

    #[test]
    fn test_crop_uses_shorter_side_and_centers() {
        let mut rgb = RgbImage::from_pixel(200, 100, image::Rgb([0, 0, 0]));
        // Mark the exact center so we can verify it survives the crop
        rgb.put_pixel(100, 50, image::Rgb([255, 0, 0]));
        let cropped = crop_center_square(&DynamicImage::ImageRgb8(rgb), 0.5);

        assert_eq!(cropped.dimensions(), (50, 50));
        assert_eq!(cropped.get_pixel(25, 25), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_crop_full_ratio_is_shorter_side() {
        let img = DynamicImage::new_rgb8(123, 77);
        let cropped = crop_center_square(&img, 1.0);
        assert_eq!(cropped.dimensions(), (77, 77));
    }

    #[test]
    fn test_resize_stretches_to_exact_dimensions() {
        let img = DynamicImage::new_rgb8(640, 480);
        let resized = resize_exact(&img, 200, 100);
        assert_eq!(resized.dimensions(), (200, 100));

        let tall = DynamicImage::new_luma8(30, 300);
        let resized = resize_exact(&tall, 200, 100);
        assert_eq!(resized.dimensions(), (200, 100));
        assert_eq!(resized.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_flatten_transparent_pixel_becomes_white() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 255, 255]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 0, 0]));

        let flat = flatten_to_white(DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.color(), image::ColorType::Rgb8);
        assert_eq!(flat.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(flat.get_pixel(1, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_flatten_half_alpha_blends_toward_white() {
        let rgba = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let flat = flatten_to_white(DynamicImage::ImageRgba8(rgba));
        let px = flat.get_pixel(0, 0);
        // 50% black over white lands near mid-gray
        assert!((px[0] as i32 - 127).abs() <= 1);
    }

    #[test]
    fn test_flatten_opaque_input_passes_through() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, image::Rgb([9, 8, 7])));
        let flat = flatten_to_white(img);
        assert_eq!(flat.color(), image::ColorType::Rgb8);
        assert_eq!(flat.get_pixel(1, 1), Rgba([9, 8, 7, 255]));
    }

    #[test]
    fn test_apply_all_order() {
        let img = DynamicImage::new_rgba8(1000, 500);
        let out = apply_all(
            img,
            &[
                TransformSpec::Flatten,
                TransformSpec::CropSquare {
                    ratio: DEFAULT_CROP_RATIO,
                },
                TransformSpec::Resize {
                    width: 120,
                    height: 80,
                },
            ],
        );
        assert_eq!(out.dimensions(), (120, 80));
    }
}
