//! Pixel buffers flowing into and out of the preprocessor.

use crate::error::OcrError;
use image::{DynamicImage, GenericImageView, GrayImage};
use serde::Serialize;

/// Timing information for a single preprocessing stage
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Scanned notice as delivered by the downloader: 8-bit samples, interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl RawImage {
    /// Wrap an interleaved sample buffer. The buffer length must match the
    /// declared dimensions.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, OcrError> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(OcrError::UnsupportedFormat(format!(
                "pixel buffer holds {} bytes, expected {} for {}x{} with {} channels",
                data.len(),
                expected,
                width,
                height,
                channels
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Decode encoded image bytes (JPEG, PNG, ...)
    pub fn decode(bytes: &[u8]) -> Result<Self, OcrError> {
        if bytes.is_empty() {
            return Err(OcrError::preprocessing("decode", "image data is empty"));
        }

        let img = image::load_from_memory(bytes)
            .map_err(|e| OcrError::UnsupportedFormat(format!("Failed to decode image: {}", e)))?;

        Ok(Self::from_dynamic(img))
    }

    /// Flatten a decoded image to 8-bit samples. Gray, RGB and RGBA layouts
    /// are kept; gray with alpha widens to RGBA.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        let color = img.color();

        let (channels, data) = match (color.channel_count(), color.has_alpha()) {
            (1, _) => (1, img.into_luma8().into_raw()),
            (_, true) => (4, img.into_rgba8().into_raw()),
            _ => (3, img.into_rgb8().into_raw()),
        };

        Self {
            width,
            height,
            channels,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Single-channel, OCR-ready image plus how long each stage took.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImage {
    /// Preprocessed image (not serialized)
    #[serde(skip)]
    pub image: GrayImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual stage timings, in execution order
    pub steps: Vec<StepTiming>,
}

impl ProcessedImage {
    /// Wrap an already prepared image, e.g. for engine tests.
    pub fn from_gray(image: GrayImage) -> Self {
        Self {
            image,
            total_time_ms: 0,
            steps: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn test_new_rejects_mismatched_buffer() {
        let err = RawImage::new(4, 4, 3, vec![0; 10]).unwrap_err();
        assert!(matches!(err, OcrError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_decode_empty_bytes_is_degenerate() {
        let err = RawImage::decode(&[]).unwrap_err();
        assert!(matches!(
            err,
            OcrError::PreprocessingError { stage: "decode", .. }
        ));
    }

    #[test]
    fn test_decode_garbage_is_unsupported() {
        let err = RawImage::decode(b"not an image").unwrap_err();
        assert!(matches!(err, OcrError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_decode_png_keeps_dimensions() {
        let mut bytes = Vec::new();
        RgbImage::new(12, 7)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let raw = RawImage::decode(&bytes).unwrap();
        assert_eq!((raw.width(), raw.height(), raw.channels()), (12, 7, 3));
        assert_eq!(raw.as_bytes().len(), 12 * 7 * 3);
    }

    #[test]
    fn test_from_dynamic_keeps_alpha_channel() {
        let raw = RawImage::from_dynamic(DynamicImage::ImageRgba8(RgbaImage::new(3, 2)));
        assert_eq!(raw.channels(), 4);
        assert!(!raw.is_empty());
    }
}
