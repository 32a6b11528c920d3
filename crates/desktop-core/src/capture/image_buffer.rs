//! Image buffer wrapper for captured screenshots
//!
//! ```
//! use desktop_core::{capture::ImageBuffer, model::Region};
//!
//! let img = ImageBuffer::from_test_pattern(1920, 1080);
//! let half = img.scale_percent(50).unwrap();
//! assert_eq!(half.dimensions(), (960, 540));
//!
//! let cropped = half.crop(Region::new(100, 100, 800, 400)).unwrap();
//! assert_eq!(cropped.dimensions(), (800, 400));
//! ```

use std::path::Path;

use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage, imageops::FilterType};

use crate::{
    error::{DesktopError, DesktopResult},
    model::Region,
};

/// Owned screenshot pixels
///
/// Transformations return new buffers and leave the original untouched.
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    inner: DynamicImage,
}

impl ImageBuffer {
    pub fn new(image: DynamicImage) -> Self {
        Self { inner: image }
    }

    /// Wraps raw RGBA pixels as returned by the capture library
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self::new(DynamicImage::ImageRgba8(image))
    }

    /// Loads an image file from disk
    pub fn open(path: &Path) -> DesktopResult<Self> {
        Ok(Self::new(image::open(path)?))
    }

    /// Resizes to `percent` of the original size (1..=100)
    ///
    /// Uses triangle filtering, which behaves like area averaging when
    /// shrinking and keeps small text legible for OCR.
    pub fn scale_percent(&self, percent: u8) -> DesktopResult<Self> {
        if !(1..=100).contains(&percent) {
            return Err(DesktopError::invalid(
                "scale_percent_for_ocr",
                format!("{} is outside 1..=100", percent),
            ));
        }
        if percent == 100 {
            return Ok(self.clone());
        }

        let (width, height) = self.dimensions();
        let new_width = (width as u64 * percent as u64 / 100).max(1) as u32;
        let new_height = (height as u64 * percent as u64 / 100).max(1) as u32;

        Ok(Self::new(
            self.inner.resize_exact(new_width, new_height, FilterType::Triangle),
        ))
    }

    /// Resizes to exact dimensions
    pub fn resize_exact(&self, width: u32, height: u32) -> Self {
        Self::new(
            self.inner
                .resize_exact(width.max(1), height.max(1), FilterType::Triangle),
        )
    }

    /// Crops to `region`, given in image coordinates
    ///
    /// The region is clipped to the image; an empty intersection is an error.
    pub fn crop(&self, region: Region) -> DesktopResult<Self> {
        let (width, height) = self.dimensions();
        let bounds = Region::new(0, 0, width, height);

        let clipped = bounds.intersect(&region).ok_or_else(|| {
            DesktopError::invalid(
                "region",
                format!(
                    "Region ({}x{} at {},{}) lies outside the image ({}x{})",
                    region.width, region.height, region.x, region.y, width, height
                ),
            )
        })?;

        Ok(Self::new(self.inner.crop_imm(
            clipped.x as u32,
            clipped.y as u32,
            clipped.width,
            clipped.height,
        )))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn to_rgba8(&self) -> RgbaImage {
        self.inner.to_rgba8()
    }

    pub fn to_rgb8(&self) -> RgbImage {
        self.inner.to_rgb8()
    }

    /// Vertical blue-to-cyan gradient used by the mock backend and tests
    pub fn from_test_pattern(width: u32, height: u32) -> Self {
        let img = RgbaImage::from_fn(width, height, |_x, y| {
            let ratio = y as f32 / height.max(1) as f32;
            image::Rgba([0, (255.0 * ratio) as u8, 255, 255])
        });
        Self::from_rgba(img)
    }

    pub fn inner(&self) -> &DynamicImage {
        &self.inner
    }

    pub fn into_inner(self) -> DynamicImage {
        self.inner
    }
}
