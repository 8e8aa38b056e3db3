use crate::error::OcrError;
use image::{imageops, GrayImage};

const STAGE: &str = "polarity";

/// Boundary between ink and paper for 8-bit luminance
pub const MID_GREY: u8 = 128;

/// Paper dominates a notice, so a page whose mean luminance is at least
/// mid-grey (127.5) is read as dark text on a light background.
///
/// Integer arithmetic keeps the decision exact: after an inversion the mean
/// lands strictly on the other side, which makes normalization idempotent.
pub fn is_dark_on_light(image: &GrayImage) -> bool {
    let sum: u64 = image.pixels().map(|p| p.0[0] as u64).sum();
    let count = image.width() as u64 * image.height() as u64;
    2 * sum >= 255 * count
}

/// Ensure dark text on a light background, inverting when needed
pub fn apply(mut image: GrayImage) -> Result<GrayImage, OcrError> {
    super::ensure_non_empty(&image, STAGE)?;

    if !is_dark_on_light(&image) {
        tracing::debug!("Inverting light-on-dark image");
        imageops::invert(&mut image);
    }

    Ok(image)
}
