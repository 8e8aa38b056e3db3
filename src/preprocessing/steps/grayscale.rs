use crate::error::OcrError;
use crate::preprocessing::RawImage;
use image::{DynamicImage, GrayImage, Luma, RgbImage, RgbaImage};

const STAGE: &str = "grayscale";

/// Collapse channels to single-channel luminance.
/// Transparent regions are composited onto white paper.
pub fn apply(image: &RawImage) -> Result<GrayImage, OcrError> {
    let (width, height) = (image.width(), image.height());
    let data = image.as_bytes().to_vec();

    let gray = match image.channels() {
        1 => GrayImage::from_raw(width, height, data),
        3 => RgbImage::from_raw(width, height, data)
            .map(|rgb| DynamicImage::ImageRgb8(rgb).into_luma8()),
        4 => RgbaImage::from_raw(width, height, data).map(|rgba| {
            let luma_alpha = DynamicImage::ImageRgba8(rgba).into_luma_alpha8();
            GrayImage::from_fn(width, height, |x, y| {
                let [l, a] = luma_alpha.get_pixel(x, y).0;
                let alpha = a as f32 / 255.0;
                Luma([(l as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8])
            })
        }),
        other => {
            return Err(OcrError::UnsupportedFormat(format!(
                "{} channels (expected 1, 3 or 4)",
                other
            )))
        }
    }
    .ok_or_else(|| OcrError::preprocessing(STAGE, "pixel buffer does not match dimensions"))?;

    super::ensure_non_empty(&gray, STAGE)?;
    Ok(gray)
}

/// Used when the grayscale stage is switched off: the scan must already be
/// single-channel.
pub fn require_single_channel(image: &RawImage) -> Result<GrayImage, OcrError> {
    if image.channels() != 1 {
        return Err(OcrError::UnsupportedFormat(format!(
            "grayscale stage disabled but image has {} channels",
            image.channels()
        )));
    }
    apply(image)
}
