use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize: {0}")]
    InitializationError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to read image: {0}")]
    ImageReadError(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Preprocessing failed in stage '{stage}': {reason}")]
    PreprocessingError { stage: &'static str, reason: String },

    #[error("OCR exceeded its time budget of {timeout_ms}ms")]
    OcrTimeout { timeout_ms: u64 },

    #[error("OCR engine returned no text")]
    OcrEmptyResult,

    #[error("OCR engine failed: {0}")]
    ProcessingError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    pub(crate) fn preprocessing(stage: &'static str, reason: impl Into<String>) -> Self {
        OcrError::PreprocessingError {
            stage,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for reports
    pub fn code(&self) -> &'static str {
        match self {
            OcrError::InitializationError(_) => "INIT_ERROR",
            OcrError::ConfigError(_) => "CONFIG_ERROR",
            OcrError::ImageReadError(_) => "IMAGE_READ_ERROR",
            OcrError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            OcrError::PreprocessingError { .. } => "PREPROCESSING_ERROR",
            OcrError::OcrTimeout { .. } => "OCR_TIMEOUT",
            OcrError::OcrEmptyResult => "OCR_EMPTY_RESULT",
            OcrError::ProcessingError(_) => "PROCESSING_ERROR",
            OcrError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Errors that would make every item fail identically.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            OcrError::InitializationError(_) | OcrError::ConfigError(_)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&OcrError> for ErrorResponse {
    fn from(err: &OcrError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}
