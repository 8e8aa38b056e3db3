use super::polarity;
use crate::error::OcrError;
use crate::preprocessing::DilateConfig;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

const STAGE: &str = "dilate";

/// Largest structuring element before neighbouring glyphs start to merge
pub const MAX_KERNEL_SIZE: u32 = 5;

/// Thicken ink strokes to reconnect glyph fragments broken by the scan.
///
/// The ink mask is grown with a square structuring element of side
/// `kernel_size`; pixels newly covered by the mask take the ink level, all
/// other pixels keep their value.
pub fn apply(image: GrayImage, params: &DilateConfig) -> Result<GrayImage, OcrError> {
    super::ensure_non_empty(&image, STAGE)?;

    let kernel = params.kernel_size;
    if kernel == 0 || kernel % 2 == 0 || kernel > MAX_KERNEL_SIZE {
        return Err(OcrError::preprocessing(
            STAGE,
            format!(
                "kernel size must be odd and at most {}, got {}",
                MAX_KERNEL_SIZE, kernel
            ),
        ));
    }

    let radius = (kernel / 2) as u8;
    if radius == 0 {
        return Ok(image);
    }

    let dark_ink = polarity::is_dark_on_light(&image);
    let ink_level = if dark_ink { 0u8 } else { 255u8 };

    let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y).0[0];
        let is_ink = if dark_ink {
            value < polarity::MID_GREY
        } else {
            value >= polarity::MID_GREY
        };
        Luma([if is_ink { 255 } else { 0 }])
    });

    let grown = morphology::dilate(&mask, Norm::LInf, radius);

    let mut thickened = image;
    for (x, y, pixel) in grown.enumerate_pixels() {
        if pixel.0[0] > 0 && mask.get_pixel(x, y).0[0] == 0 {
            thickened.put_pixel(x, y, Luma([ink_level]));
        }
    }

    Ok(thickened)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(kernel_size: u32) -> DilateConfig {
        DilateConfig {
            enabled: true,
            kernel_size,
        }
    }

    fn ink_count(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p.0[0] < polarity::MID_GREY).count()
    }

    #[test]
    fn test_dilation_reconnects_broken_stroke() {
        // Horizontal stroke with a one-pixel gap at x = 10
        let mut img = GrayImage::from_pixel(21, 9, Luma([255]));
        for x in (3..18).filter(|&x| x != 10) {
            img.put_pixel(x, 4, Luma([0]));
        }

        let result = apply(img, &params(3)).unwrap();
        assert_eq!(result.get_pixel(10, 4).0[0], 0);
    }

    #[test]
    fn test_dilation_grows_by_one_pixel_with_3x3() {
        let mut img = GrayImage::from_pixel(11, 11, Luma([255]));
        img.put_pixel(5, 5, Luma([0]));

        let result = apply(img, &params(3)).unwrap();
        assert_eq!(ink_count(&result), 9);
        assert_eq!(result.get_pixel(7, 5).0[0], 255);
    }

    #[test]
    fn test_light_ink_on_dark_paper_grows_bright() {
        let mut img = GrayImage::from_pixel(11, 11, Luma([0]));
        img.put_pixel(5, 5, Luma([255]));

        let result = apply(img, &params(3)).unwrap();
        assert_eq!(result.get_pixel(4, 4).0[0], 255);
        assert_eq!(result.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn test_kernel_of_one_is_identity() {
        let img = GrayImage::from_fn(6, 6, |x, y| Luma([((x + y) * 20) as u8]));
        assert_eq!(apply(img.clone(), &params(1)).unwrap(), img);
    }

    #[test]
    fn test_oversized_kernel_is_rejected() {
        let img = GrayImage::from_pixel(6, 6, Luma([255]));
        assert!(apply(img.clone(), &params(7)).is_err());
        assert!(apply(img, &params(2)).is_err());
    }
}
