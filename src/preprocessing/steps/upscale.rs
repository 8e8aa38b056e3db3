use super::polarity;
use crate::error::OcrError;
use crate::preprocessing::UpscaleConfig;
use image::{imageops, imageops::FilterType, GrayImage};

const STAGE: &str = "upscale";

/// Factors this close to 1.0 are not worth a resample
const SKIP_RANGE: std::ops::RangeInclusive<f32> = 0.95..=1.05;

/// Resize so that small newspaper type reaches a legible glyph height
pub fn apply(image: GrayImage, params: &UpscaleConfig) -> Result<GrayImage, OcrError> {
    super::ensure_non_empty(&image, STAGE)?;

    let (width, height) = image.dimensions();
    let mut factor = match params.factor {
        Some(factor) => factor,
        None => auto_factor(&image, params),
    };

    if !factor.is_finite() || factor <= 0.0 {
        return Err(OcrError::preprocessing(
            STAGE,
            format!("scale factor must be finite and positive, got {}", factor),
        ));
    }

    // Clamp to max dimension
    let longest = width.max(height) as f32;
    if longest * factor > params.max_dimension as f32 {
        factor = params.max_dimension as f32 / longest;
    }

    if SKIP_RANGE.contains(&factor) {
        return Ok(image);
    }

    let new_width = ((width as f32 * factor).round() as u32).max(1);
    let new_height = ((height as f32 * factor).round() as u32).max(1);

    tracing::debug!(
        "Upscaling {}x{} -> {}x{} (factor {:.2})",
        width,
        height,
        new_width,
        new_height,
        factor
    );

    Ok(imageops::resize(
        &image,
        new_width,
        new_height,
        FilterType::CatmullRom,
    ))
}

/// Factor that lifts the estimated glyph height to `min_glyph_height`,
/// never shrinking and never above `max_factor`.
pub fn auto_factor(image: &GrayImage, params: &UpscaleConfig) -> f32 {
    match estimate_glyph_height(image) {
        Some(glyph) if glyph < params.min_glyph_height => {
            (params.min_glyph_height as f32 / glyph as f32).min(params.max_factor)
        }
        _ => 1.0,
    }
}

/// Median height of the ink bands in the horizontal projection profile.
///
/// A row belongs to a band when at least 1% of its pixels (minimum one) are
/// ink. Returns `None` when the page has no ink at all.
pub fn estimate_glyph_height(image: &GrayImage) -> Option<u32> {
    let (width, height) = image.dimensions();
    let dark_ink = polarity::is_dark_on_light(image);
    let min_ink = (width / 100).max(1);

    let mut bands = Vec::new();
    let mut run = 0u32;

    for y in 0..height {
        let ink = (0..width)
            .filter(|&x| {
                let value = image.get_pixel(x, y).0[0];
                if dark_ink {
                    value < polarity::MID_GREY
                } else {
                    value >= polarity::MID_GREY
                }
            })
            .count() as u32;

        if ink >= min_ink {
            run += 1;
        } else if run > 0 {
            bands.push(run);
            run = 0;
        }
    }
    if run > 0 {
        bands.push(run);
    }

    if bands.is_empty() {
        return None;
    }
    bands.sort_unstable();
    Some(bands[bands.len() / 2])
}
