use crate::correction::RawTranscript;
use crate::error::OcrError;
use crate::preprocessing::ProcessedImage;

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize the text of a preprocessed notice
    fn recognize(&self, image: &ProcessedImage) -> Result<RawTranscript, OcrError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String> {
        vec!["eng".to_string()]
    }
}

/// Engine backed by a plain function or closure
pub struct FnEngine<F> {
    recognize: F,
}

impl<F> OcrEngine for FnEngine<F>
where
    F: Fn(&ProcessedImage) -> Result<RawTranscript, OcrError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        "fn"
    }

    fn description(&self) -> &'static str {
        "Caller-supplied recognition function"
    }

    fn recognize(&self, image: &ProcessedImage) -> Result<RawTranscript, OcrError> {
        (self.recognize)(image)
    }
}

/// Wrap a closure as an [`OcrEngine`]
pub fn ocr_fn<F>(recognize: F) -> FnEngine<F>
where
    F: Fn(&ProcessedImage) -> Result<RawTranscript, OcrError> + Send + Sync,
{
    FnEngine { recognize }
}
