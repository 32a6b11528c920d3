//! Image to tensor conversion for the detection and recognition models
//!
//! Both models take NCHW `f32` tensors in BGR channel order, which is what
//! PaddleOCR exports are trained on.

use crate::capture::ImageBuffer;

/// Per-plane statistics of the DB detector
///
/// PaddleOCR applies the ImageNet RGB values to its BGR planes as stored,
/// and the exported detectors are trained with that pairing: plane 0
/// (blue) uses 0.485/0.229.
const DET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const DET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Minimum tensor width for a recognition crop
pub const REC_MIN_WIDTH: u32 = 320;

/// Detector input plus the size it was resized to
#[derive(Debug, Clone)]
pub struct DetInput {
    /// `[1, 3, height, width]` in row-major order
    pub data:   Vec<f32>,
    pub width:  u32,
    pub height: u32,
}

/// Recognizer input for a single crop
#[derive(Debug, Clone)]
pub struct RecInput {
    /// `[1, 3, height, width]` in row-major order
    pub data:   Vec<f32>,
    pub width:  u32,
    pub height: u32,
}

/// Size the detector sees: longest side capped, both sides multiples of 32
///
/// ```
/// use desktop_core::ocr::preprocess::detection_size;
///
/// assert_eq!(detection_size(1920, 1080, 960), (960, 544));
/// assert_eq!(detection_size(100, 50, 960), (96, 64));
/// ```
pub fn detection_size(width: u32, height: u32, max_side_len: u32) -> (u32, u32) {
    let longest = width.max(height).max(1) as f32;
    let ratio = if longest > max_side_len as f32 {
        max_side_len as f32 / longest
    } else {
        1.0
    };

    let round32 = |side: u32| -> u32 {
        let scaled = (side as f32 * ratio / 32.0).round() as u32 * 32;
        scaled.max(32)
    };
    (round32(width), round32(height))
}

/// Resizes and normalises an image for the DB detector
pub fn det_input(image: &ImageBuffer, max_side_len: u32) -> DetInput {
    let (width, height) = detection_size(image.width(), image.height(), max_side_len);
    let resized = image.resize_exact(width, height).to_rgb8();

    let plane = (width * height) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (i, pixel) in resized.pixels().enumerate() {
        let [r, g, b] = pixel.0;
        for (c, value) in [b, g, r].into_iter().enumerate() {
            data[c * plane + i] = (value as f32 / 255.0 - DET_MEAN[c]) / DET_STD[c];
        }
    }

    DetInput { data, width, height }
}

/// Resizes a text crop to `height`, keeping its aspect ratio
///
/// The crop is normalised to [-1, 1] and right-padded with zeros to at
/// least [`REC_MIN_WIDTH`].
pub fn rec_input(crop: &ImageBuffer, height: u32) -> RecInput {
    let aspect = crop.width().max(1) as f32 / crop.height().max(1) as f32;
    let resized_width = ((height as f32 * aspect).ceil() as u32).max(1);
    let width = resized_width.max(REC_MIN_WIDTH);

    let resized = crop.resize_exact(resized_width, height).to_rgb8();

    let plane = (width * height) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let offset = (y * width + x) as usize;
        for (c, value) in [b, g, r].into_iter().enumerate() {
            data[c * plane + offset] = (value as f32 / 255.0 - 0.5) / 0.5;
        }
    }

    RecInput { data, width, height }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_size_keeps_small_images() {
        assert_eq!(detection_size(640, 480, 960), (640, 480));
        assert_eq!(detection_size(10, 10, 960), (32, 32));
    }

    #[test]
    fn test_detection_size_caps_long_side() {
        let (w, h) = detection_size(3840, 2160, 960);
        assert_eq!(w, 960);
        assert_eq!(h % 32, 0);
        assert!(h <= 544);
    }

    #[test]
    fn test_det_input_layout_and_normalisation() {
        let white = ImageBuffer::new(image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            64,
            32,
            image::Rgb([255, 255, 255]),
        )));
        let input = det_input(&white, 960);

        assert_eq!((input.width, input.height), (64, 32));
        assert_eq!(input.data.len(), 3 * 64 * 32);
        let expected_blue = (1.0 - DET_MEAN[0]) / DET_STD[0];
        assert!((input.data[0] - expected_blue).abs() < 1e-5);
    }

    #[test]
    fn test_det_input_blue_plane_uses_first_statistics() {
        // Pure blue: plane 0 is 1.0 and normalised with 0.485/0.229
        let blue = ImageBuffer::new(image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            32,
            32,
            image::Rgb([0, 0, 255]),
        )));
        let input = det_input(&blue, 960);
        let plane = 32 * 32;

        assert!((input.data[0] - (1.0 - 0.485) / 0.229).abs() < 1e-4);
        assert!((input.data[plane] - (0.0 - 0.456) / 0.224).abs() < 1e-4);
        assert!((input.data[2 * plane] - (0.0 - 0.406) / 0.225).abs() < 1e-4);
    }

    #[test]
    fn test_rec_input_pads_to_min_width() {
        let crop = ImageBuffer::from_test_pattern(40, 20);
        let input = rec_input(&crop, 48);

        assert_eq!(input.height, 48);
        assert_eq!(input.width, REC_MIN_WIDTH);
        assert_eq!(input.data.len(), (3 * 48 * REC_MIN_WIDTH) as usize);
        // Right of the 96px-wide resized crop is padding
        assert_eq!(input.data[200], 0.0);
    }

    #[test]
    fn test_rec_input_wide_crop_keeps_aspect() {
        let crop = ImageBuffer::from_test_pattern(960, 24);
        let input = rec_input(&crop, 48);
        assert_eq!(input.width, 1920);
        assert!(input.data.iter().all(|v| (-1.0..=1.0).contains(v)));
    }
}
