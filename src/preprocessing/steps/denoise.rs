use crate::error::OcrError;
use crate::preprocessing::DenoiseConfig;
use image::{GrayImage, Luma};

const STAGE: &str = "denoise";

/// Bilateral filter: removes speckle while keeping glyph edges.
///
/// Each neighbour inside the circular window is weighted by its spatial
/// distance and by its intensity difference from the centre pixel, so pixels
/// across an ink/paper edge contribute almost nothing.
pub fn apply(image: GrayImage, params: &DenoiseConfig) -> Result<GrayImage, OcrError> {
    super::ensure_non_empty(&image, STAGE)?;

    if !(params.sigma_color > 0.0 && params.sigma_space > 0.0) {
        return Err(OcrError::preprocessing(
            STAGE,
            format!(
                "sigmas must be positive (color {}, space {})",
                params.sigma_color, params.sigma_space
            ),
        ));
    }

    let radius = (params.diameter / 2) as i64;
    if radius == 0 {
        return Ok(image);
    }

    let kernel = spatial_kernel(radius, params.sigma_space);
    let range = range_weights(params.sigma_color);
    let (width, height) = image.dimensions();

    let filtered = GrayImage::from_fn(width, height, |x, y| {
        let center = image.get_pixel(x, y).0[0];
        let mut weighted_sum = 0.0f32;
        let mut weight_total = 0.0f32;

        for &(dx, dy, spatial) in &kernel {
            // Replicate border pixels
            let nx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
            let ny = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
            let value = image.get_pixel(nx, ny).0[0];

            let weight = spatial * range[center.abs_diff(value) as usize];
            weighted_sum += weight * value as f32;
            weight_total += weight;
        }

        Luma([(weighted_sum / weight_total).round().clamp(0.0, 255.0) as u8])
    });

    Ok(filtered)
}

/// Offsets inside the circular window with their Gaussian spatial weight
fn spatial_kernel(radius: i64, sigma_space: f32) -> Vec<(i64, i64, f32)> {
    let coeff = -0.5 / (sigma_space * sigma_space);
    let mut kernel = Vec::new();

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = (dx * dx + dy * dy) as f32;
            if dist_sq > (radius * radius) as f32 {
                continue;
            }
            kernel.push((dx, dy, (dist_sq * coeff).exp()));
        }
    }

    kernel
}

/// Gaussian weight for every possible 8-bit intensity difference
fn range_weights(sigma_color: f32) -> [f32; 256] {
    let coeff = -0.5 / (sigma_color * sigma_color);
    let mut weights = [0.0f32; 256];
    for (diff, weight) in weights.iter_mut().enumerate() {
        let d = diff as f32;
        *weight = (d * d * coeff).exp();
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variance(img: &GrayImage) -> f64 {
        let pixels: Vec<f64> = img.pixels().map(|p| p.0[0] as f64).collect();
        let mean = pixels.iter().sum::<f64>() / pixels.len() as f64;
        pixels.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / pixels.len() as f64
    }

    #[test]
    fn test_denoise_reduces_speckle() {
        let mut img = GrayImage::from_pixel(20, 20, Luma([128]));
        img.put_pixel(5, 5, Luma([100]));
        img.put_pixel(12, 8, Luma([160]));

        let result = apply(img.clone(), &DenoiseConfig::default()).unwrap();

        assert!(variance(&result) < variance(&img));
    }

    #[test]
    fn test_denoise_preserves_strong_edges() {
        let img = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        let result = apply(img, &DenoiseConfig::default()).unwrap();

        // Pixels hugging the edge stay close to their own side
        assert!(result.get_pixel(9, 5).0[0] < 10);
        assert!(result.get_pixel(10, 5).0[0] > 245);
    }

    #[test]
    fn test_uniform_image_is_unchanged() {
        let img = GrayImage::from_pixel(8, 8, Luma([77]));
        let result = apply(img.clone(), &DenoiseConfig::default()).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_invalid_sigma_is_reported() {
        let params = DenoiseConfig {
            sigma_color: 0.0,
            ..DenoiseConfig::default()
        };
        assert!(matches!(
            apply(GrayImage::new(4, 4), &params).unwrap_err(),
            OcrError::PreprocessingError { stage: "denoise", .. }
        ));
    }
}
