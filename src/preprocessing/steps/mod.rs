//! Individual preprocessing stages, in pipeline order

pub mod grayscale;
pub mod threshold;
pub mod upscale;
pub mod denoise;
pub mod contrast;
pub mod dilate;
pub mod polarity;

use crate::error::OcrError;
use image::GrayImage;

/// Reject zero-area buffers before a stage touches them
pub(crate) fn ensure_non_empty(image: &GrayImage, stage: &'static str) -> Result<(), OcrError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(OcrError::preprocessing(
            stage,
            format!("zero-area image ({}x{})", image.width(), image.height()),
        ));
    }
    Ok(())
}
