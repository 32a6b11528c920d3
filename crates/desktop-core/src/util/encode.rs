//! Screenshot encoding
//!
//! Screenshots go out as PNG unless the caller asks for another format.
//! JPEG drops the alpha channel; WebP is lossless with the `image` crate.

use std::io::Cursor;

use image::{
    ExtendedColorType, ImageEncoder,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
        webp::WebPEncoder,
    },
};

use crate::{
    capture::ImageBuffer,
    error::{DesktopError, DesktopResult},
    model::ImageFormat,
};

/// JPEG quality used for screenshots
pub const JPEG_QUALITY: u8 = 85;

fn encoding_error(format: ImageFormat, e: impl std::fmt::Display) -> DesktopError {
    DesktopError::EncodingFailed {
        format: format.to_string(),
        reason: e.to_string(),
    }
}

/// Encodes an image as PNG with the given compression level
///
/// ```
/// use desktop_core::{capture::ImageBuffer, util::encode::encode_png};
/// use image::codecs::png::CompressionType;
///
/// let img = ImageBuffer::from_test_pattern(64, 64);
/// let bytes = encode_png(&img, CompressionType::Fast).unwrap();
/// assert_eq!(&bytes[1..4], b"PNG");
/// ```
pub fn encode_png(buffer: &ImageBuffer, compression: CompressionType) -> DesktopResult<Vec<u8>> {
    let mut output = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(Cursor::new(&mut output), compression, FilterType::Adaptive);

    let rgba = buffer.to_rgba8();
    let (width, height) = rgba.dimensions();
    encoder
        .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|e| encoding_error(ImageFormat::Png, e))?;

    Ok(output)
}

/// Encodes an image as JPEG, dropping the alpha channel
pub fn encode_jpeg(buffer: &ImageBuffer, quality: u8) -> DesktopResult<Vec<u8>> {
    let rgb = buffer.inner().to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(encoding_error(ImageFormat::Jpeg, "image has no pixels"));
    }

    let mut output = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut output), quality.clamp(1, 100))
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| encoding_error(ImageFormat::Jpeg, e))?;

    Ok(output)
}

/// Encodes an image as lossless WebP
pub fn encode_webp(buffer: &ImageBuffer) -> DesktopResult<Vec<u8>> {
    let rgba = buffer.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut output = Vec::new();
    WebPEncoder::new_lossless(Cursor::new(&mut output))
        .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|e| encoding_error(ImageFormat::Webp, e))?;

    Ok(output)
}

/// Encodes an image in the requested format
pub fn encode_image(buffer: &ImageBuffer, format: ImageFormat) -> DesktopResult<Vec<u8>> {
    match format {
        ImageFormat::Png => encode_png(buffer, CompressionType::Default),
        ImageFormat::Jpeg => encode_jpeg(buffer, JPEG_QUALITY),
        ImageFormat::Webp => encode_webp(buffer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_signature() {
        let img = ImageBuffer::from_test_pattern(120, 80);
        let bytes = encode_image(&img, ImageFormat::Png).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_encode_png_is_lossless() {
        let img = ImageBuffer::from_test_pattern(50, 40);
        let bytes = encode_png(&img, CompressionType::Best).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.to_rgba8().as_raw(), img.to_rgba8().as_raw());
    }

    #[test]
    fn test_encode_jpeg_signature_and_alpha_removed() {
        let img = ImageBuffer::from_test_pattern(64, 64);
        let bytes = encode_image(&img, ImageFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_encode_webp_signature() {
        let img = ImageBuffer::from_test_pattern(64, 64);
        let bytes = encode_image(&img, ImageFormat::Webp).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_jpeg_quality_affects_size() {
        let img = ImageBuffer::from_test_pattern(400, 300);
        let low = encode_jpeg(&img, 20).unwrap();
        let high = encode_jpeg(&img, 95).unwrap();
        assert!(high.len() > low.len());
    }
}
