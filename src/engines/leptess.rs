//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine, tuned for multi-column newsprint: automatic
//! page segmentation with orientation detection, a character whitelist for
//! notice text, and preserved inter-word spacing.
//! Uses tesseract-static crate for static linking (no system dependencies).
//! Downloads tessdata (training data) automatically on first use.

use super::cache;
use crate::config::EngineConfig;
use crate::correction::RawTranscript;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::preprocessing::ProcessedImage;
use image::DynamicImage;
use std::path::PathBuf;
use tesseract_static::tesseract::Tesseract;

/// Automatic page segmentation with orientation and script detection
const PAGE_SEG_MODE: &str = "1";

/// Glyphs that appear in typeset notices
const CHAR_WHITELIST: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ.,;:'\"-()&/!? ";

/// Tesseract OCR Engine
pub struct LeptessEngine {
    tessdata_path: String,
    language: String,
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &EngineConfig) -> Result<Self, OcrError> {
        let language = config.language.clone();
        let tessdata_path = ensure_tessdata_available(config)?;

        // Fail at startup rather than on the first item
        Tesseract::new(Some(&tessdata_path), Some(&language)).map_err(|e| {
            OcrError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
        })?;

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(Self {
            tessdata_path,
            language,
        })
    }

    fn configured(&self) -> Result<Tesseract, OcrError> {
        let tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language))
            .map_err(|e| OcrError::ProcessingError(format!("Failed to create Tesseract: {}", e)))?;

        [
            ("tessedit_pageseg_mode", PAGE_SEG_MODE),
            ("tessedit_char_whitelist", CHAR_WHITELIST),
            ("preserve_interword_spaces", "1"),
        ]
        .into_iter()
        .try_fold(tess, |tess, (name, value)| {
            tess.set_variable(name, value).map_err(|e| {
                OcrError::ProcessingError(format!("Failed to set {}: {}", name, e))
            })
        })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - better for noisy or multi-column scans"
    }

    fn recognize(&self, image: &ProcessedImage) -> Result<RawTranscript, OcrError> {
        let rgb = DynamicImage::ImageLuma8(image.image.clone()).into_rgb8();
        let (width, height) = rgb.dimensions();

        // BMP is always supported by leptonica
        let mut bmp_data = Vec::new();
        rgb.write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to convert to BMP: {}", e)))?;

        tracing::debug!(
            "Processing image: {}x{}, BMP size: {} bytes",
            width,
            height,
            bmp_data.len()
        );

        let mut tess = self.configured()?.set_image_from_mem(&bmp_data).map_err(|e| {
            OcrError::ProcessingError(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                width,
                height,
                bmp_data.len(),
                e
            ))
        })?;

        tess = tess
            .recognize()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to get text: {}", e)))?;

        // mean_text_conf is on a 0-100 scale
        let confidence = tess.mean_text_conf() as f32 / 100.0;

        Ok(RawTranscript::new(text.trim()).with_confidence(confidence))
    }

    fn supported_languages(&self) -> Vec<String> {
        vec![self.language.clone()]
    }
}

/// Resolve the tessdata directory, downloading the language's training data
/// into the cache when no directory is configured
fn ensure_tessdata_available(config: &EngineConfig) -> Result<String, OcrError> {
    let dir = match &config.tessdata_path {
        Some(path) => {
            if !path.is_dir() {
                return Err(OcrError::InitializationError(format!(
                    "tessdata directory {:?} does not exist",
                    path
                )));
            }
            path.clone()
        }
        None => {
            let dir: PathBuf = cache::cache_root(config).join("tessdata");
            let filename = format!("{}.traineddata", config.language);
            cache::ensure_downloaded(&tessdata_url(&config.language), &dir, &filename)?;
            dir
        }
    };

    // Tesseract expects the directory, not the file
    dir.to_str()
        .map(str::to_string)
        .ok_or_else(|| OcrError::InitializationError("Invalid tessdata path".to_string()))
}

/// tessdata_fast keeps downloads small
fn tessdata_url(language: &str) -> String {
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tessdata_url_names_language() {
        assert!(tessdata_url("deu").ends_with("/deu.traineddata"));
    }

    #[test]
    fn test_missing_tessdata_dir_is_init_error() {
        let config = EngineConfig {
            tessdata_path: Some(PathBuf::from("/nonexistent/tessdata")),
            ..Default::default()
        };
        let err = ensure_tessdata_available(&config).unwrap_err();
        assert!(err.is_startup_fatal());
    }
}
