use crate::error::OcrError;
use image::{GrayImage, Luma};

const STAGE: &str = "contrast";

/// Stretch the histogram linearly so the darkest ink maps to 0 and the
/// brightest paper to 255. Linear, so midtones keep their relative order.
pub fn apply(image: GrayImage) -> Result<GrayImage, OcrError> {
    super::ensure_non_empty(&image, STAGE)?;
    let (min_val, max_val) = find_min_max(&image);

    if max_val <= min_val || (min_val == 0 && max_val == 255) {
        return Ok(image);
    }

    let range = (max_val - min_val) as f32;
    let stretched = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let pixel = image.get_pixel(x, y).0[0];
        let value = ((pixel - min_val) as f32 / range * 255.0).round();
        Luma([value as u8])
    });

    Ok(stretched)
}

fn find_min_max(img: &GrayImage) -> (u8, u8) {
    let mut min = 255u8;
    let mut max = 0u8;

    for pixel in img.pixels() {
        let val = pixel.0[0];
        min = min.min(val);
        max = max.max(val);
    }

    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_stretches_histogram() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([50 + (x as u8 * 15).min(150)]));
        let result = apply(img).unwrap();

        assert_eq!(find_min_max(&result), (0, 255));
    }

    #[test]
    fn test_contrast_keeps_midtones_ordered() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([[60, 120, 180][x as usize]]));
        let result = apply(img).unwrap();

        let values: Vec<u8> = result.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 128, 255]);
    }

    #[test]
    fn test_contrast_handles_uniform_image() {
        let img = GrayImage::from_pixel(10, 10, Luma([128]));
        let result = apply(img).unwrap();
        assert_eq!(result.get_pixel(0, 0).0[0], 128);
    }

    #[test]
    fn test_zero_area_is_rejected() {
        assert!(matches!(
            apply(GrayImage::new(0, 3)).unwrap_err(),
            OcrError::PreprocessingError { stage: "contrast", .. }
        ));
    }
}
