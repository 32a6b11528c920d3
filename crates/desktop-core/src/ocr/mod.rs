//! Text recognition on screenshots
//!
//! The native engine is a two-stage PaddleOCR pipeline on ONNX Runtime:
//! a DB text detector finds line boxes, then a CRNN recognizer reads each
//! crop with greedy CTC decoding. The pure pre- and post-processing lives in
//! [`preprocess`], [`db_postprocess`] and [`ctc`] so it can be tested without
//! models; the runtime glue is in `onnx` behind the `ocr` feature.

use async_trait::async_trait;

use crate::{capture::ImageBuffer, error::DesktopResult, model::TextBox};

pub mod ctc;
pub mod db_postprocess;
#[cfg(feature = "ocr")]
pub mod onnx;
pub mod preprocess;

#[cfg(feature = "ocr")]
pub use onnx::{LazyRecognizer, OnnxRecognizer};

/// Boxes whose tops differ by less than this are on the same line
const SAME_LINE_TOLERANCE: f32 = 10.0;

/// Capability: find and read text in an image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Returns text boxes in image pixel coordinates, in reading order.
    async fn recognize(&self, image: &ImageBuffer) -> DesktopResult<Vec<TextBox>>;
}

/// Sorts boxes top-to-bottom, then left-to-right within a line
///
/// ```
/// use desktop_core::{model::TextBox, ocr::sort_reading_order};
///
/// let boxes = vec![
///     TextBox::from_rect(200.0, 12.0, 260.0, 30.0, "B".into(), 0.9),
///     TextBox::from_rect(10.0, 15.0, 80.0, 30.0, "A".into(), 0.9),
///     TextBox::from_rect(10.0, 60.0, 80.0, 80.0, "C".into(), 0.9),
/// ];
/// let texts: Vec<String> = sort_reading_order(boxes).into_iter().map(|b| b.text).collect();
/// assert_eq!(texts, ["A", "B", "C"]);
/// ```
pub fn sort_reading_order(mut boxes: Vec<TextBox>) -> Vec<TextBox> {
    boxes.sort_by(|a, b| {
        let (a, b) = (a.origin(), b.origin());
        a[1].total_cmp(&b[1]).then(a[0].total_cmp(&b[0]))
    });

    // Bubble boxes on the same line into left-to-right order
    for i in 0..boxes.len().saturating_sub(1) {
        for j in (0..=i).rev() {
            let (upper, lower) = (boxes[j].origin(), boxes[j + 1].origin());
            if (lower[1] - upper[1]).abs() < SAME_LINE_TOLERANCE && lower[0] < upper[0] {
                boxes.swap(j, j + 1);
            } else {
                break;
            }
        }
    }
    boxes
}
