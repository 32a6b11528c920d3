//! Greedy CTC decoding for the recognition model

use std::path::Path;

use crate::error::{DesktopError, DesktopResult};

/// Character table for the recognizer's output classes
///
/// Class 0 is the CTC blank, classes 1..=n are the dictionary lines, and the
/// last class is a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharDictionary {
    symbols: Vec<String>,
}

impl CharDictionary {
    /// Builds a dictionary from newline-separated characters
    pub fn from_text(text: &str) -> Self {
        let mut symbols = vec![String::new()];
        symbols.extend(
            text.lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
        symbols.push(" ".to_string());
        Self { symbols }
    }

    pub fn load(path: &Path) -> DesktopResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DesktopError::OcrUnavailable {
            reason: format!("cannot read dictionary {}: {}", path.display(), e),
        })?;
        Ok(Self::from_text(&text))
    }

    /// Number of output classes, blank included
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.len() <= 2
    }

    fn symbol(&self, class: usize) -> &str {
        self.symbols.get(class).map(String::as_str).unwrap_or("")
    }
}

/// Decodes `[steps, classes]` softmax output into text and mean confidence
///
/// Repeated classes collapse and blanks are dropped. Confidence is the mean
/// of the winning probabilities over emitted characters, 0 when nothing was
/// emitted.
pub fn decode(probs: &[f32], steps: usize, classes: usize, dict: &CharDictionary) -> DesktopResult<(String, f32)> {
    if classes != dict.len() {
        return Err(DesktopError::OcrFailed {
            reason: format!(
                "recognizer emits {} classes but the dictionary has {}",
                classes,
                dict.len()
            ),
        });
    }
    if probs.len() < steps * classes {
        return Err(DesktopError::OcrFailed {
            reason: format!("expected {} logits, got {}", steps * classes, probs.len()),
        });
    }

    let mut text = String::new();
    let mut confidence_sum = 0.0;
    let mut emitted = 0usize;
    let mut previous = 0usize;

    for step in probs.chunks_exact(classes).take(steps) {
        let (class, prob) = step
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        if class != 0 && class != previous {
            text.push_str(dict.symbol(class));
            confidence_sum += prob;
            emitted += 1;
        }
        previous = class;
    }

    let confidence = if emitted == 0 {
        0.0
    } else {
        confidence_sum / emitted as f32
    };
    Ok((text, confidence))
}
