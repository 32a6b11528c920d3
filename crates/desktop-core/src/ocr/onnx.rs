//! PaddleOCR models on ONNX Runtime
//!
//! ONNX Runtime is loaded dynamically, so the shared library only has to be
//! present when OCR is actually used. Sessions are created on the first
//! OCR request by [`LazyRecognizer`] and reused afterwards.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::Tensor,
};
use parking_lot::Mutex;

use super::{
    TextRecognizer,
    ctc::{self, CharDictionary},
    db_postprocess::{self, DbParams},
    preprocess, sort_reading_order,
};
use crate::{
    capture::ImageBuffer,
    config::OcrConfig,
    error::{DesktopError, DesktopResult},
    model::{Region, TextBox},
};

/// Lines read with lower confidence are discarded
const MIN_TEXT_CONFIDENCE: f32 = 0.5;

static ORT_INIT: OnceCell<()> = OnceCell::new();

fn unavailable(reason: impl Into<String>) -> DesktopError {
    DesktopError::OcrUnavailable { reason: reason.into() }
}

fn inference_failed(stage: &str, e: impl std::fmt::Display) -> DesktopError {
    DesktopError::OcrFailed {
        reason: format!("{}: {}", stage, e),
    }
}

fn init_runtime(config: &OcrConfig) -> DesktopResult<()> {
    ORT_INIT
        .get_or_try_init(|| {
            if let Some(dylib) = &config.ort_dylib {
                tracing::info!("Loading ONNX Runtime from {}", dylib.display());
                ort::init_from(dylib.to_string_lossy().to_string())
                    .commit()
                    .map(|_| ())
                    .map_err(|e| unavailable(format!("cannot load ONNX Runtime: {}", e)))?;
            }
            Ok(())
        })
        .map(|_| ())
}

fn load_session(path: &Path, threads: usize) -> DesktopResult<Session> {
    if !path.is_file() {
        return Err(unavailable(format!("model not found: {}", path.display())));
    }

    Session::builder()
        .map_err(|e| unavailable(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| unavailable(e.to_string()))?
        .with_intra_threads(threads)
        .map_err(|e| unavailable(e.to_string()))?
        .commit_from_file(path)
        .map_err(|e| unavailable(format!("cannot load {}: {}", path.display(), e)))
}

/// Two-stage detector + recognizer
pub struct OnnxRecognizer {
    det:    Mutex<Session>,
    rec:    Mutex<Session>,
    dict:   CharDictionary,
    config: OcrConfig,
}

impl std::fmt::Debug for OnnxRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxRecognizer")
            .field("classes", &self.dict.len())
            .field("config", &self.config)
            .finish()
    }
}

impl OnnxRecognizer {
    /// Loads both models and the dictionary named in `config`
    pub fn from_config(config: &OcrConfig) -> DesktopResult<Self> {
        let (Some(det_model), Some(rec_model), Some(dict)) = (&config.det_model, &config.rec_model, &config.dict)
        else {
            return Err(unavailable(
                "detection model, recognition model and dictionary paths must all be configured",
            ));
        };

        init_runtime(config)?;

        let det = load_session(det_model, config.intra_threads)?;
        let rec = load_session(rec_model, config.intra_threads)?;
        let dict = CharDictionary::load(dict)?;
        tracing::info!(
            "OCR engine ready: {} + {} ({} classes)",
            det_model.display(),
            rec_model.display(),
            dict.len()
        );

        Ok(Self {
            det: Mutex::new(det),
            rec: Mutex::new(rec),
            dict,
            config: config.clone(),
        })
    }

    /// Runs the full pipeline on the calling thread
    pub fn recognize_blocking(&self, image: &ImageBuffer) -> DesktopResult<Vec<TextBox>> {
        let regions = self.detect(image)?;
        tracing::debug!("Detected {} text regions", regions.len());

        let mut boxes = Vec::with_capacity(regions.len());
        for region in regions {
            let left = region.left.floor().max(0.0);
            let top = region.top.floor().max(0.0);
            let crop_region = Region::new(
                left as i32,
                top as i32,
                (region.right.ceil() - left).max(1.0) as u32,
                (region.bottom.ceil() - top).max(1.0) as u32,
            );
            let Ok(crop) = image.crop(crop_region) else {
                continue;
            };

            let (text, confidence) = self.read_line(&crop)?;
            let text = text.trim().to_string();
            if text.is_empty() || confidence < MIN_TEXT_CONFIDENCE {
                continue;
            }
            boxes.push(TextBox::from_rect(
                region.left,
                region.top,
                region.right,
                region.bottom,
                text,
                confidence,
            ));
        }

        Ok(sort_reading_order(boxes))
    }

    fn detect(&self, image: &ImageBuffer) -> DesktopResult<Vec<db_postprocess::DetBox>> {
        let input = preprocess::det_input(image, self.config.max_side_len);
        let (width, height) = (input.width as usize, input.height as usize);
        let tensor = Tensor::from_array(([1usize, 3, height, width], input.data))
            .map_err(|e| inference_failed("detection input", e))?;

        let mut session = self.det.lock();
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| inference_failed("detection", e))?;
        let (shape, probs) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_failed("detection output", e))?;

        // [1, 1, H, W]
        let dims: &[i64] = shape;
        let (map_height, map_width) = match dims {
            [.., h, w] => (*h as usize, *w as usize),
            _ => return Err(inference_failed("detection output", format!("unexpected shape {:?}", dims))),
        };

        Ok(db_postprocess::extract_boxes(
            probs,
            map_width,
            map_height,
            image.width(),
            image.height(),
            DbParams::from(&self.config),
        ))
    }

    fn read_line(&self, crop: &ImageBuffer) -> DesktopResult<(String, f32)> {
        let input = preprocess::rec_input(crop, self.config.rec_image_height);
        let tensor = Tensor::from_array((
            [1usize, 3, input.height as usize, input.width as usize],
            input.data,
        ))
        .map_err(|e| inference_failed("recognition input", e))?;

        let mut session = self.rec.lock();
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| inference_failed("recognition", e))?;
        let (shape, probs) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| inference_failed("recognition output", e))?;

        // [1, T, C]
        let dims: &[i64] = shape;
        let (steps, classes) = match dims {
            [.., t, c] => (*t as usize, *c as usize),
            _ => return Err(inference_failed("recognition output", format!("unexpected shape {:?}", dims))),
        };

        ctc::decode(probs, steps, classes, &self.dict)
    }
}

/// Recognizer that loads its models on first use
///
/// Creating the engine reads two models from disk and may load the ONNX
/// Runtime library, so a server that never receives an OCR request never
/// pays for it. A failed load is not cached; the next request retries.
#[derive(Debug, Clone)]
pub struct LazyRecognizer {
    config: OcrConfig,
    engine: Arc<OnceCell<Arc<OnnxRecognizer>>>,
}

impl LazyRecognizer {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            engine: Arc::new(OnceCell::new()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.get().is_some()
    }
}

#[async_trait]
impl TextRecognizer for LazyRecognizer {
    async fn recognize(&self, image: &ImageBuffer) -> DesktopResult<Vec<TextBox>> {
        if !self.config.is_configured() {
            return Err(unavailable(
                "no OCR models configured; set --ocr-det-model, --ocr-rec-model and --ocr-dict",
            ));
        }

        let config = self.config.clone();
        let engine = self.engine.clone();
        let image = image.clone();

        tokio::task::spawn_blocking(move || {
            let engine = engine.get_or_try_init(|| OnnxRecognizer::from_config(&config).map(Arc::new))?;
            engine.recognize_blocking(&image)
        })
        .await
        .map_err(|e| inference_failed("OCR task", e))?
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[tokio::test]
    async fn test_lazy_recognizer_unconfigured() {
        let recognizer = LazyRecognizer::new(OcrConfig::default());
        let result = recognizer.recognize(&ImageBuffer::from_test_pattern(32, 32)).await;

        assert!(matches!(result, Err(DesktopError::OcrUnavailable { .. })));
        assert!(!recognizer.is_loaded());
    }

    #[tokio::test]
    async fn test_lazy_recognizer_missing_model_files() {
        let config = OcrConfig {
            det_model: Some(PathBuf::from("/nonexistent/det.onnx")),
            rec_model: Some(PathBuf::from("/nonexistent/rec.onnx")),
            dict: Some(PathBuf::from("/nonexistent/keys.txt")),
            ..Default::default()
        };
        let recognizer = LazyRecognizer::new(config);
        let result = recognizer.recognize(&ImageBuffer::from_test_pattern(32, 32)).await;

        match result {
            Err(DesktopError::OcrUnavailable { reason }) => assert!(reason.contains("det.onnx")),
            other => panic!("expected OcrUnavailable, got {:?}", other),
        }
        assert!(!recognizer.is_loaded());
    }

    #[test]
    fn test_from_config_requires_all_paths() {
        let config = OcrConfig {
            det_model: Some(PathBuf::from("det.onnx")),
            ..Default::default()
        };
        assert!(matches!(
            OnnxRecognizer::from_config(&config),
            Err(DesktopError::OcrUnavailable { .. })
        ));
    }
}
