//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.

use super::cache;
use crate::config::EngineConfig;
use crate::correction::RawTranscript;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::preprocessing::ProcessedImage;
use image::DynamicImage;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: OcrsOcrEngine,
}

impl OcrsEngine {
    /// Create the engine, downloading models if needed
    pub fn new(config: &EngineConfig) -> Result<Self, OcrError> {
        if config.language != "eng" {
            tracing::warn!(
                "ocrs only reads Latin-script English models; ignoring language '{}'",
                config.language
            );
        }

        let dir = cache::cache_root(config);
        let detection_path =
            cache::ensure_downloaded(DETECTION_MODEL_URL, &dir, "text-detection.rten")?;
        let recognition_path =
            cache::ensure_downloaded(RECOGNITION_MODEL_URL, &dir, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized");
        Ok(Self { engine })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn recognize(&self, image: &ProcessedImage) -> Result<RawTranscript, OcrError> {
        // ocrs expects HWC RGB bytes
        let rgb = DynamicImage::ImageLuma8(image.image.clone()).into_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions()).map_err(|e| {
            OcrError::ProcessingError(format!("Failed to create image source: {}", e))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to prepare input: {}", e)))?;
        let words = self
            .engine
            .detect_words(&input)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to detect words: {}", e)))?;
        let lines = self.engine.find_text_lines(&input, &words);
        let line_texts = self
            .engine
            .recognize_text(&input, &lines)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;

        let lines: Vec<String> = line_texts
            .iter()
            .flatten()
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        tracing::debug!("ocrs read {} lines", lines.len());
        Ok(transcript_from_lines(lines))
    }
}

/// ocrs reports no recognition scores, so its transcripts carry no confidence
fn transcript_from_lines(lines: Vec<String>) -> RawTranscript {
    RawTranscript::new(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_join_without_confidence() {
        let raw = transcript_from_lines(vec![
            "IN LOVING MEMORY".to_string(),
            "Survived by friends".to_string(),
        ]);
        assert_eq!(raw.text, "IN LOVING MEMORY\nSurvived by friends");
        assert_eq!(raw.confidence, None);
    }

    #[test]
    fn test_no_lines_is_blank() {
        assert!(transcript_from_lines(Vec::new()).is_blank());
    }
}
