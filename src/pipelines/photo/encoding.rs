// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Turns a rasterized RGBA canvas into encoded bytes. Encoding is CPU-bound
//! and is run on a blocking task by the callers.

use crate::constants::encoding::JPEG_QUALITY_CEILING;
use image::RgbaImage;
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    #[default]
    Jpeg,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Map a 0.0 - 1.0 quality factor onto the JPEG 1 - 100 scale
pub fn jpeg_quality(quality: f32) -> u8 {
    let quality = if quality.is_finite() { quality } else { 1.0 };
    let scaled = (quality.clamp(0.0, 1.0) * JPEG_QUALITY_CEILING as f32).round() as u8;
    scaled.max(1)
}

/// Encode an RGBA canvas
///
/// # Arguments
/// * `image` - Canvas pixels
/// * `format` - Target format
/// * `quality` - Quality factor between 0.0 and 1.0 (lossy formats only)
pub fn encode_image(
    image: &RgbaImage,
    format: EncodingFormat,
    quality: f32,
) -> Result<Vec<u8>, String> {
    if image.width() == 0 || image.height() == 0 {
        return Err("cannot encode an empty canvas".to_string());
    }

    let data = match format {
        EncodingFormat::Jpeg => encode_jpeg(image, jpeg_quality(quality))?,
    };

    debug!(size = data.len(), format = ?format, "Encoding complete");
    Ok(data)
}

/// Encode image as JPEG
fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, String> {
    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();

    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);

    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| format!("JPEG encoding failed: {}", e))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_extensions() {
        assert_eq!(EncodingFormat::Jpeg.extension(), "jpg");
        assert_eq!(EncodingFormat::Jpeg.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_quality_factor_mapping() {
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.92), 92);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(7.5), 100);
        assert_eq!(jpeg_quality(f32::NAN), 100);
    }

    #[test]
    fn test_jpeg_has_soi_marker() {
        let image = RgbaImage::from_pixel(8, 8, image::Rgba([200, 10, 10, 255]));
        let data = encode_image(&image, EncodingFormat::Jpeg, 1.0).unwrap();
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_empty_canvas_is_rejected() {
        let image = RgbaImage::new(0, 0);
        assert!(encode_image(&image, EncodingFormat::Jpeg, 1.0).is_err());
    }
}
