use crate::error::OcrError;
use crate::preprocessing::ThresholdConfig;
use image::{GrayImage, Luma};

const STAGE: &str = "threshold";

/// Dynamic range of the standard deviation for 8-bit images
const R: f64 = 128.0;

/// Apply Sauvola adaptive thresholding
/// Tolerates the uneven lighting of old newspaper scans
pub fn apply(image: GrayImage, params: &ThresholdConfig) -> Result<GrayImage, OcrError> {
    super::ensure_non_empty(&image, STAGE)?;
    if params.block_size < 3 || params.block_size % 2 == 0 {
        return Err(OcrError::preprocessing(
            STAGE,
            format!("block size must be odd and >= 3, got {}", params.block_size),
        ));
    }
    sauvola_threshold(&image, params.block_size, params.bias as f64)
}

/// Sauvola adaptive thresholding
///
/// For each pixel, threshold = mean * (1 + k * (std_dev / R - 1))
/// where R is max standard deviation (128 for 8-bit images)
fn sauvola_threshold(img: &GrayImage, window_size: u32, k: f64) -> Result<GrayImage, OcrError> {
    let (width, height) = img.dimensions();
    let half_window = window_size as i64 / 2;

    let (integral, integral_sq) = compute_integral_images(img);
    let mut binarized = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let x1 = (x as i64 - half_window).max(0) as usize;
        let y1 = (y as i64 - half_window).max(0) as usize;
        let x2 = (x as i64 + half_window).min(width as i64 - 1) as usize;
        let y2 = (y as i64 + half_window).min(height as i64 - 1) as usize;

        let (mean, std_dev) = window_stats(&integral, &integral_sq, x1, y1, x2, y2);
        let threshold = mean * (1.0 + k * (std_dev / R - 1.0));

        if !threshold.is_finite() {
            return Err(OcrError::preprocessing(
                STAGE,
                format!("non-finite threshold at ({}, {})", x, y),
            ));
        }

        let value = if pixel.0[0] as f64 > threshold { 255 } else { 0 };
        binarized.put_pixel(x, y, Luma([value]));
    }

    Ok(binarized)
}

/// Integral image and integral of squared values, one row/column of padding
fn compute_integral_images(img: &GrayImage) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let (width, height) = img.dimensions();
    let mut integral = vec![vec![0.0f64; width as usize + 1]; height as usize + 1];
    let mut integral_sq = vec![vec![0.0f64; width as usize + 1]; height as usize + 1];

    for y in 0..height as usize {
        for x in 0..width as usize {
            let val = img.get_pixel(x as u32, y as u32).0[0] as f64;
            integral[y + 1][x + 1] =
                val + integral[y][x + 1] + integral[y + 1][x] - integral[y][x];
            integral_sq[y + 1][x + 1] =
                val * val + integral_sq[y][x + 1] + integral_sq[y + 1][x] - integral_sq[y][x];
        }
    }

    (integral, integral_sq)
}

/// Mean and standard deviation of an inclusive window
fn window_stats(
    integral: &[Vec<f64>],
    integral_sq: &[Vec<f64>],
    x1: usize,
    y1: usize,
    x2: usize,
    y2: usize,
) -> (f64, f64) {
    let (x2, y2) = (x2 + 1, y2 + 1);
    let area = ((x2 - x1) * (y2 - y1)) as f64;

    let sum = integral[y2][x2] - integral[y1][x2] - integral[y2][x1] + integral[y1][x1];
    let sum_sq =
        integral_sq[y2][x2] - integral_sq[y1][x2] - integral_sq[y2][x1] + integral_sq[y1][x1];

    let mean = sum / area;
    let variance = (sum_sq / area) - (mean * mean);

    (mean, variance.max(0.0).sqrt())
}
